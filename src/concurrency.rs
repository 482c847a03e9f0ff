//! Cooperative cancellation and a bounded parallel map over independent inputs.

use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag checked at per-line loop boundaries. Cloning shares the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Map `f` over `items` with at most `limit` calls in flight, keeping input order.
/// `limit <= 1` runs sequentially on the calling thread.
pub fn map_limited<T, R, F>(items: &[T], limit: usize, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Sync + Fn(usize, &T) -> R,
{
    if limit <= 1 {
        return items.iter().enumerate().map(|(i, t)| f(i, t)).collect();
    }
    let mut out = Vec::with_capacity(items.len());
    for (ci, chunk) in items.chunks(limit).enumerate() {
        let part: Vec<R> = chunk
            .par_iter()
            .enumerate()
            .map(|(j, t)| f(ci * limit + j, t))
            .collect();
        out.extend(part);
    }
    out
}
