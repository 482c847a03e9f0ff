//! Multi-File Aggregator: run the single-file filter over an ordered list of
//! archives, one output per input, and record a tagged outcome for each.
//! A failing archive never stops the batch.

use crate::concurrency::map_limited;
use crate::error::ArchiveError;
use crate::filter::{filter_to_path, FilterSpec};
use crate::paths::{display_name, filtered_output_path};
use crate::progress::make_count_progress;
use ahash::AHashSet;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Per-file result. Distinguishes "no matches" from "could not be processed".
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileOutcome {
    Extracted(usize),
    NotFound,
    Failed(String),
    Cancelled,
}

impl FileOutcome {
    /// Posts counted toward the batch; anything but `Extracted` is zero.
    pub fn count(&self) -> usize {
        match self {
            FileOutcome::Extracted(n) => *n,
            _ => 0,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Extracted(_))
    }
}

#[derive(Clone, Debug)]
pub struct FileResult {
    pub name: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub outcome: FileOutcome,
}

/// Results in input order.
#[derive(Clone, Debug, Default)]
pub struct AggregateReport {
    pub files: Vec<FileResult>,
}

impl AggregateReport {
    /// `file name -> count`. Failed and cancelled files map to 0; missing files are left out.
    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.files
            .iter()
            .filter(|f| f.outcome != FileOutcome::NotFound)
            .map(|f| (f.name.clone(), f.outcome.count()))
            .collect()
    }

    pub fn outcome(&self, name: &str) -> Option<&FileOutcome> {
        self.files.iter().find(|f| f.name == name).map(|f| &f.outcome)
    }

    pub fn total_extracted(&self) -> usize {
        self.files.iter().map(|f| f.outcome.count()).sum()
    }

    /// Outputs of the files that completed, in input order (input for `combine`).
    pub fn output_paths(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter(|f| f.outcome.is_success())
            .map(|f| f.output.clone())
            .collect()
    }
}

fn process_one(input: &Path, output: &Path, spec: &FilterSpec) -> FileOutcome {
    if spec.cancel.is_cancelled() {
        return FileOutcome::Cancelled;
    }
    if !input.exists() {
        tracing::warn!("dump file not found: {}", input.display());
        return FileOutcome::NotFound;
    }
    match filter_to_path(input, spec, output) {
        Ok(r) if r.cancelled => FileOutcome::Cancelled,
        Ok(r) => FileOutcome::Extracted(r.emitted),
        Err(ArchiveError::FileNotFound { path }) => {
            tracing::warn!("dump file not found: {}", path.display());
            FileOutcome::NotFound
        }
        Err(e) => {
            tracing::error!("error processing {}: {}", input.display(), e);
            FileOutcome::Failed(e.to_string())
        }
    }
}

/// Filter every archive in `inputs` into `output_dir/filtered_<stem>.jsonl`.
///
/// - Inputs are independent; up to `file_concurrency` run at once.
/// - Only an unusable `output_dir` is fatal.
/// - An input whose output name was already claimed by an earlier input is
///   recorded as `Failed` and skipped.
pub fn aggregate(
    inputs: &[PathBuf],
    spec: &FilterSpec,
    output_dir: &Path,
    file_concurrency: usize,
) -> Result<AggregateReport> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("create output dir {}", output_dir.display()))?;

    let mut claimed = AHashSet::new();
    let planned: Vec<(PathBuf, PathBuf, bool)> = inputs
        .iter()
        .map(|input| {
            let out = filtered_output_path(output_dir, input);
            let fresh = claimed.insert(out.clone());
            (input.clone(), out, fresh)
        })
        .collect();

    let pb = if spec.progress_bar {
        Some(make_count_progress(planned.len() as u64, "Filtering archives"))
    } else {
        None
    };
    // Per-file byte bars would fight the batch bar.
    let per_file = spec.clone().progress_bar(false);

    let files = map_limited(&planned, file_concurrency, |_, (input, output, fresh)| {
        let outcome = if *fresh {
            process_one(input, output, &per_file)
        } else {
            tracing::error!("skipping {}: output {} already claimed", input.display(), output.display());
            FileOutcome::Failed(format!("output name collides with an earlier input: {}", output.display()))
        };
        if let Some(pb) = &pb {
            pb.inc(1);
        }
        FileResult { name: display_name(input), input: input.clone(), output: output.clone(), outcome }
    });

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let report = AggregateReport { files };
    tracing::info!(
        "aggregated {} files: {} posts, {} failed, {} missing",
        report.files.len(),
        report.total_extracted(),
        report.files.iter().filter(|f| matches!(f.outcome, FileOutcome::Failed(_))).count(),
        report.files.iter().filter(|f| f.outcome == FileOutcome::NotFound).count(),
    );
    Ok(report)
}
