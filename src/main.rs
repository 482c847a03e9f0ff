use anyhow::Result;
use dumpsift::{
    aggregate, combine, cutoff_from_months_back, init_tracing_once, normalize_community, plan_recent_archives,
    posts_for_community, select, FileOutcome, HarvestOptions, Reporter,
};
use std::collections::BTreeMap;
use time::OffsetDateTime;

fn main() -> Result<()> {
    init_tracing_once();
    let opts = HarvestOptions::default().from_env();
    let now = OffsetDateTime::now_utc();

    let archives = plan_recent_archives(&opts.dump_dir, opts.months_back, now.date());
    println!("Found {} archives under {}", archives.len(), opts.dump_dir.display());

    let spec = opts.filter_spec();
    let report = aggregate(&archives, &spec, &opts.filtered_dir, opts.file_concurrency)?;
    for f in &report.files {
        match &f.outcome {
            FileOutcome::Extracted(n) => println!("  {}: {} posts", f.name, n),
            FileOutcome::NotFound => println!("  {}: missing", f.name),
            FileOutcome::Failed(why) => println!("  {}: failed ({})", f.name, why),
            FileOutcome::Cancelled => println!("  {}: cancelled", f.name),
        }
    }

    let combined = opts.filtered_dir.join("combined_posts.jsonl");
    let total = combine(&report.output_paths(), &combined, None)?;
    println!("Combined {} posts into {}", total, combined.display());

    let cutoff = cutoff_from_months_back(now, opts.months_back);
    let mut all_posts = BTreeMap::new();
    for community in &opts.communities {
        let posts = posts_for_community(&combined, community, None)?;
        let picked = select(posts, cutoff, opts.posts_per_community);
        all_posts.insert(normalize_community(community), picked);
    }

    let reporter = Reporter::new(&opts.output_dir)?.at(now);
    for (community, posts) in &all_posts {
        if posts.is_empty() {
            continue;
        }
        reporter.save_posts_json(community, posts, None)?;
        reporter.save_posts_csv(community, posts, None)?;
    }
    let combined_json = reporter.save_combined(&all_posts, None)?;
    let summary = reporter.write_summary_report(&all_posts)?;

    let kept: usize = all_posts.values().map(Vec::len).sum();
    println!("Kept {} posts across {} communities in {}", kept, all_posts.len(), reporter.dir().display());
    println!("Wrote {} and {}", combined_json.display(), summary.display());
    Ok(())
}
