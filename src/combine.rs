//! Merge/Combine: concatenate already-filtered JSONL files into one, line by
//! line and byte for byte, stopping at an optional global cap.

use crate::concurrency::CancelToken;
use crate::util::{create_with_backoff, open_with_backoff, part_path, promote_file, remove_quietly};
use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const BUF_BYTES: usize = 256 * 1024;

/// Concatenate `inputs` into `output`, skipping inputs that do not exist.
/// Returns the number of lines written.
pub fn combine(inputs: &[PathBuf], output: &Path, max_posts: Option<usize>) -> Result<usize> {
    combine_with_cancel(inputs, output, max_posts, &CancelToken::new())
}

/// As `combine`, checking `cancel` once per line. On cancellation the lines
/// copied so far are flushed and kept.
pub fn combine_with_cancel(
    inputs: &[PathBuf],
    output: &Path,
    max_posts: Option<usize>,
    cancel: &CancelToken,
) -> Result<usize> {
    let tmp = part_path(output);
    let file = create_with_backoff(&tmp).with_context(|| format!("create {}", tmp.display()))?;
    let mut out = BufWriter::with_capacity(BUF_BYTES, file);

    let copied = copy_lines(inputs, &mut out, max_posts, cancel);
    let total = match copied.and_then(|n| {
        out.flush().with_context(|| format!("flush {}", tmp.display()))?;
        Ok(n)
    }) {
        Ok(n) => n,
        Err(e) => {
            drop(out);
            let _ = remove_quietly(&tmp);
            return Err(e);
        }
    };
    drop(out);
    promote_file(&tmp, output)?;

    tracing::info!("combined {} posts into {}", total, output.display());
    Ok(total)
}

fn copy_lines<W: Write>(
    inputs: &[PathBuf],
    out: &mut W,
    max_posts: Option<usize>,
    cancel: &CancelToken,
) -> Result<usize> {
    let mut total = 0usize;
    let mut line: Vec<u8> = Vec::with_capacity(16 * 1024);

    'files: for path in inputs {
        if max_posts.is_some_and(|m| total >= m) {
            break;
        }
        if !path.exists() {
            continue;
        }
        tracing::info!("combining {}", path.display());
        let f = open_with_backoff(path).with_context(|| format!("open {}", path.display()))?;
        let mut r = BufReader::with_capacity(BUF_BYTES, f);
        loop {
            if max_posts.is_some_and(|m| total >= m) {
                break 'files;
            }
            if cancel.is_cancelled() {
                tracing::warn!("combine cancelled after {} lines", total);
                break 'files;
            }
            line.clear();
            let n = r
                .read_until(b'\n', &mut line)
                .with_context(|| format!("read {}", path.display()))?;
            if n == 0 {
                break;
            }
            out.write_all(&line)?;
            total += 1;
        }
    }
    Ok(total)
}
