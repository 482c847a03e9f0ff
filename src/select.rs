//! Dedup + Time-Window Selector over an already materialized batch of posts.

use crate::post::NormalizedPost;
use ahash::AHashSet;

/// Keep the first occurrence of each `id`, drop posts older than `cutoff`,
/// order newest first (stable on ties), keep at most `max_posts`.
/// Posts with an empty `id` cannot be deduplicated and are dropped.
pub fn select(posts: Vec<NormalizedPost>, cutoff: i64, max_posts: usize) -> Vec<NormalizedPost> {
    let mut seen: AHashSet<String> = AHashSet::with_capacity(posts.len());
    let mut kept: Vec<NormalizedPost> = posts
        .into_iter()
        .filter(|p| !p.id.is_empty() && seen.insert(p.id.clone()))
        .filter(|p| p.created_utc >= cutoff)
        .collect();

    // `sort_by` is stable.
    kept.sort_by(|a, b| b.created_utc.cmp(&a.created_utc));
    kept.truncate(max_posts);
    kept
}

/// Dedup only, first occurrence wins. Empty ids are dropped as in `select`.
pub fn dedup_by_id(posts: Vec<NormalizedPost>) -> Vec<NormalizedPost> {
    let mut seen: AHashSet<String> = AHashSet::with_capacity(posts.len());
    posts.into_iter().filter(|p| !p.id.is_empty() && seen.insert(p.id.clone())).collect()
}
