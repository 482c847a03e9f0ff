#[path = "common/mod.rs"]
mod common;

use common::*;
use dumpsift::{filter_archive, split_community_list, HarvestOptions, DEFAULT_COMMUNITIES};
use std::collections::HashMap;
use std::path::PathBuf;

/// Defaults describe the stock harvest.
#[test]
fn defaults() {
    let o = HarvestOptions::default();
    assert_eq!(o.communities.len(), DEFAULT_COMMUNITIES.len());
    assert_eq!(o.posts_per_community, 3000);
    assert_eq!(o.months_back, 24);
    assert_eq!(o.output_dir, PathBuf::from("data"));
    assert_eq!(o.dump_dir, PathBuf::from("pushshift_data"));
    assert_eq!(o.filtered_dir, PathBuf::from("filtered_data"));
    assert_eq!(o.max_posts_per_file, None);
    assert_eq!(o.max_posts_per_request, 100);
    assert_eq!(o.file_concurrency, 1);
    assert!(!o.force_plain_text);

    let targets = o.targets();
    assert!(targets.contains("breakups"));
    assert!(targets.contains("AskReddit"));
}

/// Overrides replace what they name; unparseable numbers are ignored.
#[test]
fn overlay_overrides() {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("DUMPSIFT_COMMUNITIES", "math, r/Anxiety;rust"),
        ("DUMPSIFT_POSTS_PER_COMMUNITY", "50"),
        ("DUMPSIFT_MONTHS_BACK", "six"),
        ("DUMPSIFT_DUMP_DIR", "/tmp/dumps"),
        ("DUMPSIFT_MAX_POSTS_PER_FILE", "7"),
        ("DUMPSIFT_FILE_CONCURRENCY", "0"),
    ]);
    let o = HarvestOptions::default().overlay(|k| vars.get(k).map(|v| v.to_string()));

    assert_eq!(o.communities, vec!["math", "r/Anxiety", "rust"]);
    assert_eq!(o.posts_per_community, 50);
    assert_eq!(o.months_back, 24);
    assert_eq!(o.dump_dir, PathBuf::from("/tmp/dumps"));
    assert_eq!(o.output_dir, PathBuf::from("data"));
    assert_eq!(o.max_posts_per_file, Some(7));
    assert_eq!(o.file_concurrency, 1);
    assert_eq!(o.targets().sorted(), vec!["anxiety", "math", "rust"]);
}

#[test]
fn community_list_separators() {
    assert_eq!(split_community_list(" a,b ;c\td  "), vec!["a", "b", "c", "d"]);
    assert!(split_community_list(" , ; ").is_empty());
}

/// The derived filter settings carry targets, cap and codec choice.
#[test]
fn filter_spec_from_options() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("RS_2023-11.bz2");
    write_plain_lines(&path, &sample_month_lines());

    let strict = HarvestOptions::default().with_communities(["depression"]).with_progress(false);
    assert!(filter_archive(&path, &strict.filter_spec()).is_err());

    let forced = strict.with_force_plain_text(true).with_max_posts_per_file(Some(3));
    let (report, posts) = filter_archive(&path, &forced.filter_spec()).unwrap();
    assert_eq!(report.emitted, 3);
    assert_eq!(posts.len(), 3);
}
