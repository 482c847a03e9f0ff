//! Archive discovery (`RS_YYYY-MM[.json][.<suffix>]`), recent-month planning,
//! and the deterministic per-input output name.

use crate::date::{recent_months, YearMonth};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use time::Date;
use walkdir::WalkDir;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ArchiveFile {
    pub ym: YearMonth,
    pub path: PathBuf,
}

fn archive_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^RS_(\d{4})-(\d{2})(?:\.(?:json|jsonl|ndjson))?(?:\.[A-Za-z0-9]+)?$").unwrap()
    })
}

/// Parse the month out of a submission archive file name.
pub fn archive_month(name: &str) -> Option<YearMonth> {
    let caps = archive_name_re().captures(name)?;
    let year: u16 = caps[1].parse().ok()?;
    let month: u8 = caps[2].parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some(YearMonth { year, month })
}

/// All submission archives directly under `dir`, oldest month first.
/// A missing directory yields an empty list.
pub fn discover_archives(dir: &Path) -> Vec<ArchiveFile> {
    let mut found = Vec::new();
    if !dir.exists() {
        return found;
    }
    for ent in WalkDir::new(dir).min_depth(1).max_depth(1).into_iter().flatten() {
        if !ent.file_type().is_file() {
            continue;
        }
        if let Some(ym) = ent.file_name().to_str().and_then(archive_month) {
            found.push(ArchiveFile { ym, path: ent.path().to_path_buf() });
        }
    }
    found.sort();
    found
}

/// Archives under `dir` for the last `months_back` months counted from `today`,
/// newest month first.
pub fn plan_recent_archives(dir: &Path, months_back: u32, today: Date) -> Vec<PathBuf> {
    let wanted = recent_months(today, months_back);
    let found = discover_archives(dir);
    let mut plan = Vec::new();
    for ym in wanted {
        plan.extend(found.iter().filter(|a| a.ym == ym).map(|a| a.path.clone()));
    }
    if plan.is_empty() {
        tracing::warn!("no archives under {} for the last {} months", dir.display(), months_back);
    }
    plan
}

/// `<output_dir>/filtered_<stem>.jsonl`, where `stem` drops only the last extension.
pub fn filtered_output_path(output_dir: &Path, input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("archive");
    output_dir.join(format!("filtered_{stem}.jsonl"))
}

/// File name used as the key in batch results.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
