use crate::archive::DEFAULT_READ_BUF;
use crate::codec::CodecRegistry;
use crate::filter::{FilterSpec, DEFAULT_PROGRESS_EVERY};
use crate::post::CommunityTargets;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_COMMUNITIES: [&str; 12] = [
    "antiwork",
    "raisedbynarcissists",
    "survivinginfidelity",
    "BreakUps",
    "depression",
    "Anxiety",
    "TrueOffMyChest",
    "offmychest",
    "RedditForGrownups",
    "selfimprovement",
    "AskReddit",
    "math",
];

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct HarvestOptions {
    pub communities: Vec<String>,
    pub posts_per_community: usize,
    pub months_back: u32,
    pub output_dir: PathBuf,          // reports and combined files
    pub dump_dir: PathBuf,            // RS_YYYY-MM archives
    pub filtered_dir: PathBuf,        // filtered_<stem>.jsonl per archive
    pub max_posts_per_file: Option<usize>,
    pub max_posts_per_request: usize, // live API page size
    pub file_concurrency: usize,      // archives processed at once
    pub progress: bool,
    pub force_plain_text: bool,       // read bz2/lz4/7z as text instead of refusing
    pub progress_every_lines: u64,

    // IO tuning
    pub read_buffer_bytes: usize,
    pub write_buffer_bytes: usize,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            communities: DEFAULT_COMMUNITIES.iter().map(|s| s.to_string()).collect(),
            posts_per_community: 3000,
            months_back: 24,
            output_dir: PathBuf::from("data"),
            dump_dir: PathBuf::from("pushshift_data"),
            filtered_dir: PathBuf::from("filtered_data"),
            max_posts_per_file: None,
            max_posts_per_request: 100,
            file_concurrency: 1, // large archives; sequential unless asked
            progress: true,
            force_plain_text: false,
            progress_every_lines: DEFAULT_PROGRESS_EVERY,

            read_buffer_bytes: DEFAULT_READ_BUF,
            write_buffer_bytes: DEFAULT_READ_BUF,
        }
    }
}

fn parse_num<T: FromStr>(key: &str, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("ignoring {}={:?}: not a number", key, raw);
            None
        }
    }
}

/// Split a community list on commas, semicolons or whitespace.
pub fn split_community_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl HarvestOptions {
    /// Overlay `DUMPSIFT_*` environment variables on top of `self`.
    pub fn from_env(self) -> Self {
        self.overlay(|k| env::var(k).ok())
    }

    /// Overlay settings looked up by `DUMPSIFT_*` key through `lookup`.
    pub fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let text = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());
        let num = |k: &str| parse_num::<usize>(k, text(k));
        if let Some(list) = text("DUMPSIFT_COMMUNITIES") {
            let names = split_community_list(&list);
            if !names.is_empty() {
                self.communities = names;
            }
        }
        if let Some(n) = num("DUMPSIFT_POSTS_PER_COMMUNITY") {
            self.posts_per_community = n;
        }
        if let Some(n) = num("DUMPSIFT_MONTHS_BACK") {
            self.months_back = n.min(u32::MAX as usize) as u32;
        }
        if let Some(d) = text("DUMPSIFT_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(d);
        }
        if let Some(d) = text("DUMPSIFT_DUMP_DIR") {
            self.dump_dir = PathBuf::from(d);
        }
        if let Some(n) = num("DUMPSIFT_MAX_POSTS_PER_FILE") {
            self.max_posts_per_file = Some(n);
        }
        if let Some(n) = num("DUMPSIFT_FILE_CONCURRENCY") {
            self.file_concurrency = n.max(1);
        }
        self
    }

    pub fn with_communities<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.communities = names.into_iter().map(Into::into).collect();
        self
    }
    pub fn with_posts_per_community(mut self, n: usize) -> Self {
        self.posts_per_community = n;
        self
    }
    pub fn with_months_back(mut self, months: u32) -> Self {
        self.months_back = months;
        self
    }
    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }
    pub fn with_dump_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dump_dir = dir.as_ref().to_path_buf();
        self
    }
    pub fn with_filtered_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.filtered_dir = dir.as_ref().to_path_buf();
        self
    }
    pub fn with_max_posts_per_file(mut self, max: Option<usize>) -> Self {
        self.max_posts_per_file = max;
        self
    }
    pub fn with_max_posts_per_request(mut self, n: usize) -> Self {
        self.max_posts_per_request = n.max(1);
        self
    }
    pub fn with_file_concurrency(mut self, n: usize) -> Self {
        self.file_concurrency = n.max(1);
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_force_plain_text(mut self, yes: bool) -> Self {
        self.force_plain_text = yes;
        self
    }
    pub fn with_progress_every_lines(mut self, lines: u64) -> Self {
        self.progress_every_lines = lines.max(1);
        self
    }

    // IO buffers tuning
    pub fn with_io_buffers(mut self, read_bytes: usize, write_bytes: usize) -> Self {
        self.read_buffer_bytes = read_bytes.max(8 * 1024);
        self.write_buffer_bytes = write_bytes.max(8 * 1024);
        self
    }

    /// Normalized target set; invalid names are dropped with a warning.
    pub fn targets(&self) -> CommunityTargets {
        CommunityTargets::validated(&self.communities)
    }

    pub fn codec_registry(&self) -> CodecRegistry {
        CodecRegistry::standard().force_plain_text(self.force_plain_text)
    }

    /// Filter settings for one archive pass derived from these options.
    pub fn filter_spec(&self) -> FilterSpec {
        FilterSpec::new(self.targets())
            .max_posts(self.max_posts_per_file)
            .registry(self.codec_registry())
            .io_buffers(self.read_buffer_bytes, self.write_buffer_bytes)
            .progress_every(self.progress_every_lines)
            .progress_bar(self.progress)
    }
}
