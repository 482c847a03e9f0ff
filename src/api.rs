//! Seam for the live listing API. The HTTP client itself lives outside this
//! crate; it plugs in through `PostSource`. Pacing and retries are explicit
//! objects owned by the collector rather than wrappers around the call.

use crate::date::cutoff_from_months_back;
use crate::json_utils::is_truthy;
use crate::post::{normalize_community, NormalizedPost};
use crate::select::select;
use anyhow::Result;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::thread::sleep;
use std::time::{Duration, Instant};
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeFilter {
    All,
    Year,
    Month,
    Week,
    Day,
    Hour,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    New,
    Hot,
    Top,
    Rising,
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeFilter::All => "all",
            TimeFilter::Year => "year",
            TimeFilter::Month => "month",
            TimeFilter::Week => "week",
            TimeFilter::Day => "day",
            TimeFilter::Hour => "hour",
        })
    }
}

/// A listing endpoint: up to `limit` raw post objects for one community.
/// Items use the same field names as `NormalizedPost`.
pub trait PostSource {
    fn fetch(&mut self, community: &str, limit: usize, time_filter: TimeFilter, sort: SortOrder) -> Result<Vec<Value>>;
}

/// Minimum spacing between calls.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval, last: Mutex::new(None) }
    }

    /// `calls_per_minute == 0` disables pacing.
    pub fn per_minute(calls_per_minute: u32) -> Self {
        if calls_per_minute == 0 {
            return Self::new(Duration::ZERO);
        }
        Self::new(Duration::from_secs_f64(60.0 / calls_per_minute as f64))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Block until a call is allowed; returns how long we waited.
    pub fn acquire(&self) -> Duration {
        let mut last = self.last.lock();
        let mut waited = Duration::ZERO;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                waited = self.min_interval - elapsed;
                tracing::debug!("rate limiting: waiting {:.2?}", waited);
                sleep(waited);
            }
        }
        *last = Some(Instant::now());
        waited
    }
}

/// Exponential backoff: attempt `n` (0-based) waits `base * multiplier^n`, capped.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self { max_retries: 0, base_delay: Duration::ZERO, multiplier: 1.0, max_delay: Duration::ZERO }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.min(i32::MAX as u32) as i32);
        let secs = (self.base_delay.as_secs_f64() * factor).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Run `op`, retrying up to `max_retries` more times after failures.
    pub fn run<T>(&self, label: &str, mut op: impl FnMut() -> Result<T>) -> Result<T> {
        let mut attempt = 0u32;
        loop {
            match op() {
                Ok(v) => return Ok(v),
                Err(e) if attempt >= self.max_retries => {
                    tracing::error!("{} failed after {} retries: {:#}", label, self.max_retries, e);
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!("attempt {} failed for {}: {:#}; retrying in {:.2?}", attempt + 1, label, e, delay);
                    sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}

/// Gathers recent self posts for a community from a `PostSource`.
pub struct TimeframeCollector<S: PostSource> {
    source: S,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

impl<S: PostSource> TimeframeCollector<S> {
    pub fn new(source: S) -> Self {
        Self { source, limiter: RateLimiter::per_minute(60), retry: RetryPolicy::default() }
    }
    pub fn rate_limiter(mut self, limiter: RateLimiter) -> Self { self.limiter = limiter; self }
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self { self.retry = retry; self }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Up to `max_posts` distinct self posts newer than `months_back` months
    /// before `now`, newest first. Listings are tried widest first
    /// (all, year, month) until enough candidates are held. A listing that
    /// keeps failing contributes nothing.
    pub fn collect(&mut self, community: &str, months_back: u32, max_posts: usize, now: OffsetDateTime) -> Vec<NormalizedPost> {
        let cutoff = cutoff_from_months_back(now, months_back);
        let name = normalize_community(community);
        tracing::info!("fetching posts from r/{} from the last {} months", name, months_back);

        let mut candidates: Vec<NormalizedPost> = Vec::new();
        for tf in [TimeFilter::All, TimeFilter::Year, TimeFilter::Month] {
            if candidates.len() >= max_posts {
                break;
            }
            let remaining = max_posts - candidates.len();
            self.limiter.acquire();

            let label = format!("fetch r/{name} ({tf})");
            let source = &mut self.source;
            let batch = match self.retry.run(&label, || source.fetch(&name, remaining, tf, SortOrder::New)) {
                Ok(b) => b,
                Err(e) => {
                    tracing::error!("error fetching posts from r/{}: {:#}", name, e);
                    Vec::new()
                }
            };

            let before = candidates.len();
            for item in batch {
                let Value::Object(mut map) = item else { continue };
                if !map.get("is_self").map(is_truthy).unwrap_or(false) {
                    continue;
                }
                if map.get("subreddit").and_then(|v| v.as_str()).is_none() {
                    map.insert("subreddit".into(), Value::String(name.clone()));
                }
                match NormalizedPost::from_raw(&map) {
                    Ok(p) if p.created_utc >= cutoff => candidates.push(p),
                    _ => {}
                }
            }
            tracing::info!("added {} posts from {} filter", candidates.len() - before, tf);
        }

        let picked = select(candidates, cutoff, max_posts);
        tracing::info!("final count for r/{}: {} posts", name, picked.len());
        picked
    }

    /// `collect` for each community in order; failures yield empty lists.
    pub fn collect_all<I, T>(&mut self, communities: I, months_back: u32, max_posts: usize, now: OffsetDateTime) -> BTreeMap<String, Vec<NormalizedPost>>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut all = BTreeMap::new();
        for c in communities {
            let posts = self.collect(c.as_ref(), months_back, max_posts, now);
            all.insert(normalize_community(c.as_ref()), posts);
        }
        all
    }
}
