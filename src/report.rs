//! Persisting collected posts: per-community JSON documents and CSV tables,
//! a combined JSON document, and a plain-text summary report.

use crate::date::{file_stamp, format_day, format_timestamp};
use crate::post::NormalizedPost;
use crate::util::create_with_backoff;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostsMetadata {
    pub subreddit: String,
    pub total_posts: usize,
    pub scraped_at: String,
    pub date_range: String,
}

/// One community's posts plus metadata, as written by `save_posts_json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostsDocument {
    pub metadata: PostsMetadata,
    pub posts: Vec<NormalizedPost>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommunityStats {
    pub post_count: usize,
    pub date_range: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombinedMetadata {
    pub total_subreddits: usize,
    pub scraped_at: String,
    pub subreddit_stats: BTreeMap<String, CommunityStats>,
    pub total_posts: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombinedDocument {
    pub metadata: CombinedMetadata,
    pub posts_by_subreddit: BTreeMap<String, Vec<NormalizedPost>>,
}

/// `"YYYY-MM-DD to YYYY-MM-DD"` over `created_utc`, or `"No posts"`.
pub fn date_range_text(posts: &[NormalizedPost]) -> String {
    let lo = posts.iter().map(|p| p.created_utc).min();
    let hi = posts.iter().map(|p| p.created_utc).max();
    match (lo, hi) {
        (Some(lo), Some(hi)) => format!("{} to {}", format_day(lo), format_day(hi)),
        _ => "No posts".to_string(),
    }
}

pub fn average_score(posts: &[NormalizedPost]) -> f64 {
    if posts.is_empty() {
        return 0.0;
    }
    posts.iter().map(|p| p.score as f64).sum::<f64>() / posts.len() as f64
}

pub fn average_comments(posts: &[NormalizedPost]) -> f64 {
    if posts.is_empty() {
        return 0.0;
    }
    posts.iter().map(|p| p.num_comments as f64).sum::<f64>() / posts.len() as f64
}

/// Keep posts meeting every threshold (score, comments, title+body length).
pub fn filter_by_criteria(posts: &[NormalizedPost], min_score: i64, min_comments: i64, min_text_length: usize) -> Vec<NormalizedPost> {
    let kept: Vec<NormalizedPost> = posts
        .iter()
        .filter(|p| p.score >= min_score && p.num_comments >= min_comments && p.text_len() >= min_text_length)
        .cloned()
        .collect();
    tracing::info!("filtered {} posts down to {} posts", posts.len(), kept.len());
    kept
}

/// Read a document written by `save_posts_json`.
pub fn load_posts_json(path: &Path) -> Result<PostsDocument> {
    let f = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let doc: PostsDocument = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse {}", path.display()))?;
    tracing::info!("loaded {} posts from {}", doc.metadata.total_posts, path.display());
    Ok(doc)
}

/// CSV header, in `NormalizedPost` field order so serialized rows line up.
const CSV_COLUMNS: [&str; 18] = [
    "id", "created_utc", "title", "selftext", "author", "subreddit", "url", "permalink", "score",
    "num_comments", "upvote_ratio", "over_18", "spoiler", "locked", "archived", "stickied", "is_self",
    "distinguished",
];

/// Writes result files into one output directory.
pub struct Reporter {
    dir: PathBuf,
    now: OffsetDateTime,
}

impl Reporter {
    /// Creates `dir` if needed; failing to do so is fatal.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.exists() {
            fs::create_dir_all(&dir).with_context(|| format!("create output dir {}", dir.display()))?;
            tracing::info!("created output directory: {}", dir.display());
        }
        Ok(Self { dir, now: OffsetDateTime::now_utc() })
    }

    /// Pin the clock used for timestamps and default file names.
    pub fn at(mut self, now: OffsetDateTime) -> Self {
        self.now = now;
        self
    }

    /// Where result files land.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn scraped_at(&self) -> String {
        self.now.format(&Rfc3339).unwrap_or_else(|_| self.now.unix_timestamp().to_string())
    }

    fn target(&self, filename: Option<&str>, default_stem: &str, ext: &str) -> PathBuf {
        match filename {
            Some(f) => self.dir.join(f),
            None => self.dir.join(format!("{}_{}.{}", default_stem, file_stamp(self.now), ext)),
        }
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let f = create_with_backoff(path).with_context(|| format!("create {}", path.display()))?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, value)?;
        w.flush().with_context(|| format!("flush {}", path.display()))?;
        Ok(())
    }

    /// `<community>_posts_<stamp>.json` unless `filename` is given.
    pub fn save_posts_json(&self, community: &str, posts: &[NormalizedPost], filename: Option<&str>) -> Result<PathBuf> {
        let path = self.target(filename, &format!("{community}_posts"), "json");
        let doc = PostsDocument {
            metadata: PostsMetadata {
                subreddit: community.to_string(),
                total_posts: posts.len(),
                scraped_at: self.scraped_at(),
                date_range: date_range_text(posts),
            },
            posts: posts.to_vec(),
        };
        self.write_json(&path, &doc)?;
        tracing::info!("saved {} posts to {}", posts.len(), path.display());
        Ok(path)
    }

    /// CSV table with `#` metadata lines on top. The header is written even when `posts` is empty.
    pub fn save_posts_csv(&self, community: &str, posts: &[NormalizedPost], filename: Option<&str>) -> Result<PathBuf> {
        let path = self.target(filename, &format!("{community}_posts"), "csv");
        let f = create_with_backoff(&path).with_context(|| format!("create {}", path.display()))?;
        let mut w = BufWriter::new(f);
        writeln!(w, "# Subreddit: {community}")?;
        writeln!(w, "# Total posts: {}", posts.len())?;
        writeln!(w, "# Scraped at: {}", self.scraped_at())?;
        writeln!(w, "# Date range: {}", date_range_text(posts))?;

        let mut table = csv::WriterBuilder::new().has_headers(false).from_writer(w);
        table.write_record(CSV_COLUMNS)?;
        for p in posts {
            table.serialize(p).with_context(|| format!("write post {} to {}", p.id, path.display()))?;
        }
        table.flush().with_context(|| format!("flush {}", path.display()))?;
        tracing::info!("saved {} posts to {}", posts.len(), path.display());
        Ok(path)
    }

    /// All communities in one document, with per-community stats.
    pub fn save_combined(&self, all_posts: &BTreeMap<String, Vec<NormalizedPost>>, filename: Option<&str>) -> Result<PathBuf> {
        let path = self.target(filename, "all_subreddits_posts", "json");
        let subreddit_stats = all_posts
            .iter()
            .map(|(name, posts)| {
                (name.clone(), CommunityStats { post_count: posts.len(), date_range: date_range_text(posts) })
            })
            .collect();
        let total_posts = all_posts.values().map(Vec::len).sum();
        let doc = CombinedDocument {
            metadata: CombinedMetadata {
                total_subreddits: all_posts.len(),
                scraped_at: self.scraped_at(),
                subreddit_stats,
                total_posts,
            },
            posts_by_subreddit: all_posts.clone(),
        };
        self.write_json(&path, &doc)?;
        tracing::info!(
            "saved combined data with {} posts from {} subreddits to {}",
            total_posts,
            all_posts.len(),
            path.display()
        );
        Ok(path)
    }

    /// Human-readable `scraping_summary_<stamp>.txt`.
    pub fn write_summary_report(&self, all_posts: &BTreeMap<String, Vec<NormalizedPost>>) -> Result<PathBuf> {
        let path = self.target(None, "scraping_summary", "txt");
        let f = create_with_backoff(&path).with_context(|| format!("create {}", path.display()))?;
        let mut w = BufWriter::new(f);

        writeln!(w, "REDDIT SCRAPING SUMMARY REPORT")?;
        writeln!(w, "{}", "=".repeat(50))?;
        writeln!(w)?;
        writeln!(w, "Generated at: {}", format_timestamp(self.now))?;
        writeln!(w)?;

        let mut total = 0usize;
        for (name, posts) in all_posts {
            writeln!(w, "Subreddit: r/{name}")?;
            writeln!(w, "  Posts collected: {}", posts.len())?;
            writeln!(w, "  Date range: {}", date_range_text(posts))?;
            writeln!(w, "  Average score: {:.2}", average_score(posts))?;
            writeln!(w, "  Average comments: {:.2}", average_comments(posts))?;
            writeln!(w)?;
            total += posts.len();
        }
        writeln!(w, "TOTAL POSTS COLLECTED: {total}")?;
        writeln!(w, "TOTAL SUBREDDITS: {}", all_posts.len())?;
        w.flush().with_context(|| format!("flush {}", path.display()))?;

        tracing::info!("created summary report: {}", path.display());
        Ok(path)
    }
}
