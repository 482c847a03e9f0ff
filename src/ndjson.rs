//! Reading and writing filtered JSONL files (one post object per line).

use crate::post::{normalize_community, NormalizedPost};
use crate::util::{create_with_backoff, open_with_backoff, part_path, promote_file};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Buffered line reader that strips `\r?\n`.
pub struct NdjsonReader {
    rdr: BufReader<File>,
}

impl NdjsonReader {
    pub fn open(path: &Path, buf_bytes: usize) -> io::Result<Self> {
        let f = open_with_backoff(path)?;
        Ok(Self { rdr: BufReader::with_capacity(buf_bytes.max(8 * 1024), f) })
    }

    /// Returns bytes consumed; 0 at EOF.
    pub fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        buf.clear();
        let n = self.rdr.read_line(buf)?;
        if buf.ends_with('\n') {
            buf.pop();
            if buf.ends_with('\r') {
                buf.pop();
            }
        }
        Ok(n)
    }
}

fn read_posts_where(
    path: &Path,
    max_posts: Option<usize>,
    mut keep: impl FnMut(&NormalizedPost) -> bool,
) -> Result<Vec<NormalizedPost>> {
    let mut rdr = NdjsonReader::open(path, 64 * 1024).with_context(|| format!("open {}", path.display()))?;
    let mut posts = Vec::new();
    let mut buf = String::new();
    loop {
        if max_posts.is_some_and(|m| posts.len() >= m) {
            break;
        }
        if rdr.read_line(&mut buf).with_context(|| format!("read {}", path.display()))? == 0 {
            break;
        }
        if buf.trim().is_empty() {
            continue;
        }
        if let Ok(post) = NormalizedPost::from_line(&buf) {
            if keep(&post) {
                posts.push(post);
            }
        }
    }
    Ok(posts)
}

/// Load posts from a filtered file, skipping malformed lines.
pub fn load_filtered_posts(path: &Path, max_posts: Option<usize>) -> Result<Vec<NormalizedPost>> {
    let posts = read_posts_where(path, max_posts, |_| true)?;
    tracing::info!("loaded {} posts from {}", posts.len(), path.display());
    Ok(posts)
}

/// Posts of one community (case-insensitive) from a filtered file.
pub fn posts_for_community(path: &Path, community: &str, max_posts: Option<usize>) -> Result<Vec<NormalizedPost>> {
    let want = normalize_community(community);
    let posts = read_posts_where(path, max_posts, |p| p.subreddit.to_lowercase() == want)?;
    tracing::info!("found {} posts for r/{}", posts.len(), community);
    Ok(posts)
}

/// Write posts one JSON object per line; the file appears only once complete.
pub fn write_posts_jsonl(path: &Path, posts: &[NormalizedPost]) -> Result<()> {
    let tmp = part_path(path);
    let f = create_with_backoff(&tmp).with_context(|| format!("create {}", tmp.display()))?;
    let mut w = BufWriter::new(f);
    for p in posts {
        serde_json::to_writer(&mut w, p)?;
        w.write_all(b"\n")?;
    }
    w.flush().with_context(|| format!("flush {}", tmp.display()))?;
    drop(w);
    promote_file(&tmp, path)
}
