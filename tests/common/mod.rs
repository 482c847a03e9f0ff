#![allow(dead_code)]

use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
}

/// Plain JSONL file, one line per entry.
pub fn write_plain_lines(path: &Path, lines: &[String]) {
    ensure_parent(path);
    let mut f = File::create(path).unwrap();
    for l in lines {
        writeln!(f, "{}", l).unwrap();
    }
}

/// Compressed `.gz` file containing the provided JSONL lines.
pub fn write_gz_lines(path: &Path, lines: &[String]) {
    ensure_parent(path);
    let f = File::create(path).unwrap();
    let mut enc = flate2::write::GzEncoder::new(f, flate2::Compression::default());
    for l in lines {
        writeln!(&mut enc, "{}", l).unwrap();
    }
    enc.finish().unwrap();
}

/// Compressed `.xz` file containing the provided JSONL lines.
pub fn write_xz_lines(path: &Path, lines: &[String]) {
    ensure_parent(path);
    let f = File::create(path).unwrap();
    let mut enc = xz2::write::XzEncoder::new(f, 6);
    for l in lines {
        writeln!(&mut enc, "{}", l).unwrap();
    }
    enc.finish().unwrap();
}

/// Compressed `.zst` file containing the provided JSONL lines.
/// This mirrors the monthly RS_ dumps but with tiny content.
pub fn write_zst_lines(path: &Path, lines: &[String]) {
    ensure_parent(path);
    let f = File::create(path).unwrap();
    let mut enc = zstd::stream::write::Encoder::new(f, 3).unwrap();
    for l in lines {
        writeln!(&mut enc, "{}", l).unwrap();
    }
    enc.finish().unwrap();
}

/// Read a JSONL file into a vector of `serde_json::Value` (skips empty lines).
pub fn read_jsonl_values(path: &Path) -> Vec<Value> {
    let f = File::open(path).unwrap();
    let r = BufReader::new(f);
    r.lines()
        .map(|l| l.unwrap())
        .filter(|s| !s.is_empty())
        .map(|s| serde_json::from_str(&s).unwrap())
        .collect()
}

/// Read a text file line-by-line into strings (skips empty lines).
pub fn read_lines(path: &Path) -> Vec<String> {
    let f = File::open(path).unwrap();
    let r = BufReader::new(f);
    r.lines().map(|l| l.unwrap()).filter(|s| !s.is_empty()).collect()
}

/// A raw archive record with the allow-listed fields plus some noise the
/// projection must drop.
pub fn raw_post(id: &str, subreddit: &str, is_self: bool, created_utc: i64) -> Value {
    json!({
        "id": id,
        "created_utc": created_utc,
        "title": format!("title {id}"),
        "selftext": format!("body of {id}"),
        "author": "alice",
        "num_comments": 4,
        "score": 12,
        "permalink": format!("/r/{subreddit}/comments/{id}/"),
        "url": format!("https://www.reddit.com/r/{subreddit}/comments/{id}/"),
        "subreddit": subreddit,
        "upvote_ratio": 0.93,
        "over_18": false,
        "spoiler": false,
        "locked": false,
        "archived": false,
        "distinguished": null,
        "stickied": false,
        "is_self": is_self,
        "domain": format!("self.{subreddit}"),
        "gilded": 0,
        "retrieved_on": created_utc + 60,
        "media": null,
    })
}

pub fn raw_line(id: &str, subreddit: &str, is_self: bool, created_utc: i64) -> String {
    raw_post(id, subreddit, is_self, created_utc).to_string()
}

/// Ten-line month: 4 self posts in r/depression (one with upper-case name),
/// 2 link posts there, 2 self posts elsewhere, 1 malformed line, 1 non-object.
pub fn sample_month_lines() -> Vec<String> {
    vec![
        raw_line("a1", "depression", true, 1_700_000_000),
        raw_line("a2", "depression", false, 1_700_000_100),
        raw_line("a3", "Depression", true, 1_700_000_200),
        "{this is not json".to_string(),
        raw_line("a4", "rust", true, 1_700_000_300),
        raw_line("a5", "depression", true, 1_700_000_400),
        "[1, 2, 3]".to_string(),
        raw_line("a6", "depression", false, 1_700_000_500),
        raw_line("a7", "math", true, 1_700_000_600),
        raw_line("a8", "depression", true, 1_700_000_700),
    ]
}

/// Ids of the self posts in r/depression from `sample_month_lines`, in file order.
pub const SAMPLE_MATCH_IDS: [&str; 4] = ["a1", "a3", "a5", "a8"];

pub fn ids_of(values: &[Value]) -> Vec<String> {
    values.iter().map(|v| v["id"].as_str().unwrap_or_default().to_string()).collect()
}
