//! Single-File Filter: stream one archive, keep self posts from target
//! communities, project them to the allow-list, stop at an optional cap.
//!
//! Two entry points share one scan loop:
//!  - `filter_archive` collects `NormalizedPost`s in memory.
//!  - `filter_to_path` writes each projected record as it is found, into a
//!    `.part` file promoted on success, so memory stays flat for huge archives.

use crate::archive::{ArchiveReader, DEFAULT_READ_BUF};
use crate::codec::CodecRegistry;
use crate::concurrency::CancelToken;
use crate::error::ArchiveError;
use crate::json_utils::is_truthy;
use crate::post::{project_post, CommunityTargets, NormalizedPost};
use crate::progress::make_byte_progress;
use crate::util::{create_with_backoff, part_path, promote_file, remove_quietly};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_PROGRESS_EVERY: u64 = 100_000;

/// Everything one filter pass needs besides the input path.
#[derive(Clone, Debug)]
pub struct FilterSpec {
    pub targets: CommunityTargets,
    pub max_posts: Option<usize>,
    pub registry: CodecRegistry,
    pub read_buf_bytes: usize,
    pub write_buf_bytes: usize,
    pub progress_every_lines: u64,
    pub progress_bar: bool,
    pub cancel: CancelToken,
}

impl FilterSpec {
    pub fn new(targets: CommunityTargets) -> Self {
        Self {
            targets,
            max_posts: None,
            registry: CodecRegistry::standard(),
            read_buf_bytes: DEFAULT_READ_BUF,
            write_buf_bytes: DEFAULT_READ_BUF,
            progress_every_lines: DEFAULT_PROGRESS_EVERY,
            progress_bar: false,
            cancel: CancelToken::new(),
        }
    }
    pub fn max_posts(mut self, max: Option<usize>) -> Self { self.max_posts = max; self }
    pub fn registry(mut self, registry: CodecRegistry) -> Self { self.registry = registry; self }
    pub fn io_buffers(mut self, read_bytes: usize, write_bytes: usize) -> Self {
        self.read_buf_bytes = read_bytes.max(8 * 1024);
        self.write_buf_bytes = write_bytes.max(8 * 1024);
        self
    }
    pub fn progress_every(mut self, lines: u64) -> Self { self.progress_every_lines = lines.max(1); self }
    pub fn progress_bar(mut self, yes: bool) -> Self { self.progress_bar = yes; self }
    pub fn cancel_token(mut self, token: CancelToken) -> Self { self.cancel = token; self }
}

/// What one pass saw.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub path: PathBuf,
    pub emitted: usize,
    pub lines_scanned: u64,
    pub malformed: u64,
    pub cancelled: bool,
}

/// Only the two gate fields; everything else is skipped by serde.
#[derive(Deserialize)]
struct GateFields {
    #[serde(default)]
    subreddit: Option<Value>,
    #[serde(default)]
    is_self: Option<Value>,
}

fn gate_passes(targets: &CommunityTargets, subreddit: Option<&Value>, is_self: Option<&Value>) -> bool {
    let in_target = match subreddit.and_then(|v| v.as_str()) {
        Some(s) => targets.contains(s),
        None => false,
    };
    in_target && is_self.map(is_truthy).unwrap_or(false)
}

/// Membership + self-post predicate over a decoded record.
pub fn is_target_self_post(record: &Map<String, Value>, targets: &CommunityTargets) -> bool {
    gate_passes(targets, record.get("subreddit"), record.get("is_self"))
}

/// The shared scan loop. `on_match` receives each projected record.
fn scan_archive(
    path: &Path,
    spec: &FilterSpec,
    mut on_match: impl FnMut(Map<String, Value>) -> Result<(), ArchiveError>,
) -> Result<FilterReport, ArchiveError> {
    let mut reader = ArchiveReader::open_with(path, &spec.registry, spec.read_buf_bytes)?;
    let pb = if spec.progress_bar {
        let total = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        Some(make_byte_progress(total, &path.display().to_string()))
    } else {
        None
    };

    tracing::info!("filtering {} for communities {:?}", path.display(), spec.targets.sorted());

    let mut report = FilterReport { path: path.to_path_buf(), ..Default::default() };
    let mut buf = String::with_capacity(16 * 1024);

    loop {
        if let Some(max) = spec.max_posts {
            if report.emitted >= max {
                break;
            }
        }
        if spec.cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }
        if !reader.read_line(&mut buf)? {
            break;
        }
        report.lines_scanned += 1;

        if report.lines_scanned % spec.progress_every_lines.max(1) == 0 {
            tracing::info!(
                "processed {} lines, extracted {} posts",
                report.lines_scanned,
                report.emitted
            );
            if let Some(pb) = &pb {
                pb.set_position(reader.compressed_bytes_read());
            }
        }

        // Objects only; serde would otherwise accept a struct in array form.
        if !buf.trim_start().starts_with('{') {
            report.malformed += 1;
            continue;
        }
        let record = match serde_json::from_str::<GateFields>(&buf) {
            Ok(gate) => {
                if !gate_passes(&spec.targets, gate.subreddit.as_ref(), gate.is_self.as_ref()) {
                    continue;
                }
                // Full parse only for the lines that pass the gate.
                match serde_json::from_str::<Value>(&buf) {
                    Ok(Value::Object(map)) => map,
                    _ => {
                        report.malformed += 1;
                        continue;
                    }
                }
            }
            // Repeated keys are valid JSON (last one wins) but the struct form rejects them.
            Err(_) => match serde_json::from_str::<Value>(&buf) {
                Ok(Value::Object(map)) => {
                    if !is_target_self_post(&map, &spec.targets) {
                        continue;
                    }
                    map
                }
                _ => {
                    report.malformed += 1;
                    continue;
                }
            },
        };
        on_match(project_post(&record))?;
        report.emitted += 1;
    }

    if let Some(pb) = pb {
        pb.finish_with_message(format!("{} posts", report.emitted));
    }
    tracing::info!("extracted {} posts from {}", report.emitted, path.display());
    Ok(report)
}

/// Filter one archive into memory.
pub fn filter_archive(path: &Path, spec: &FilterSpec) -> Result<(FilterReport, Vec<NormalizedPost>), ArchiveError> {
    let mut posts = Vec::new();
    let report = scan_archive(path, spec, |projected| {
        if let Ok(post) = serde_json::from_value::<NormalizedPost>(Value::Object(projected)) {
            posts.push(post);
        }
        Ok(())
    })?;
    Ok((report, posts))
}

fn unwritable(path: &Path, source: io::Error) -> ArchiveError {
    ArchiveError::OutputUnwritable { path: path.to_path_buf(), source }
}

/// Filter one archive, appending each projected record to `out_path` as it is found.
/// The output only appears under `out_path` after a complete, uncancelled pass.
pub fn filter_to_path(path: &Path, spec: &FilterSpec, out_path: &Path) -> Result<FilterReport, ArchiveError> {
    let tmp = part_path(out_path);
    let file = create_with_backoff(&tmp).map_err(|e| unwritable(&tmp, e))?;
    let mut w = BufWriter::with_capacity(spec.write_buf_bytes, file);

    let result = scan_archive(path, spec, |projected| {
        serde_json::to_writer(&mut w, &Value::Object(projected))
            .map_err(|e| unwritable(&tmp, e.into()))?;
        w.write_all(b"\n").map_err(|e| unwritable(&tmp, e))
    });
    let flushed = w.flush().map_err(|e| unwritable(&tmp, e));
    drop(w);

    let report = match (result, flushed) {
        (Ok(r), Ok(())) => r,
        (Err(e), _) | (Ok(_), Err(e)) => {
            let _ = remove_quietly(&tmp);
            return Err(e);
        }
    };

    if report.cancelled {
        tracing::warn!("cancelled while filtering {}; discarding partial output", path.display());
        let _ = remove_quietly(&tmp);
        return Ok(report);
    }

    promote_file(&tmp, out_path)
        .map_err(|e| unwritable(out_path, io::Error::new(io::ErrorKind::Other, format!("{e:#}"))))?;
    Ok(report)
}
