mod config;
mod date;
mod paths;
mod error;

mod post;
mod json_utils;
mod codec;
mod archive;
mod filter;
mod aggregate;
mod combine;
mod select;

mod concurrency;
mod progress;
mod util;

mod api;
mod ndjson;
mod report;
mod integrity;

pub use crate::config::{split_community_list, HarvestOptions, DEFAULT_COMMUNITIES};
pub use crate::date::{cutoff_from_months_back, format_day, recent_months, YearMonth};
pub use crate::error::ArchiveError;
pub use crate::paths::{archive_month, discover_archives, filtered_output_path, plan_recent_archives, ArchiveFile};

// Core pipeline stages.
pub use crate::post::{
    is_valid_community_name, normalize_community, project, project_post, CommunityTargets, NormalizedPost,
    DELETED_AUTHOR, KEEP_FIELDS,
};
pub use crate::json_utils::is_truthy;
pub use crate::codec::{BoxedRead, Codec, CodecRegistry};
pub use crate::archive::{ArchiveReader, DEFAULT_READ_BUF};
pub use crate::filter::{filter_archive, filter_to_path, is_target_self_post, FilterReport, FilterSpec, DEFAULT_PROGRESS_EVERY};
pub use crate::aggregate::{aggregate, AggregateReport, FileOutcome, FileResult};
pub use crate::combine::{combine, combine_with_cancel};
pub use crate::select::{dedup_by_id, select};

// Cancellation and bounded fan-out.
pub use crate::concurrency::{map_limited, CancelToken};

// Expose multiprogress and progress helpers.
pub use crate::progress::{make_byte_progress, make_count_progress, set_global_multiprogress};

//export robust file ops from util so binaries can import from crate root.
pub use crate::util::{create_with_backoff, init_tracing_once, open_with_backoff, promote_file};

// Live API seam.
pub use crate::api::{PostSource, RateLimiter, RetryPolicy, SortOrder, TimeFilter, TimeframeCollector};

// Filtered-file access and result persistence.
pub use crate::ndjson::{load_filtered_posts, posts_for_community, write_posts_jsonl, NdjsonReader};
pub use crate::report::{
    average_comments, average_score, date_range_text, filter_by_criteria, load_posts_json, CombinedDocument,
    CombinedMetadata, CommunityStats, PostsDocument, PostsMetadata, Reporter,
};

// Expose integrity checker mode.
pub use crate::integrity::{check_archives, IntegrityMode};
