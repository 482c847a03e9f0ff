use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

static INIT_ONCE: std::sync::Once = std::sync::Once::new();

/// Install a `tracing` subscriber driven by `RUST_LOG` (default `info`). Idempotent.
pub fn init_tracing_once() {
    INIT_ONCE.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    });
}

// -------- file ops with backoff (AV scanners / network shares hold handles briefly) --------

const TRIES: usize = 16;
const DELAY_MS: u64 = 50;

fn is_retriable_io_error(e: &io::Error) -> bool {
    // Windows: access denied, sharing/lock violation, AV block, device not ready,
    // volume altered, I/O device error, user-mapped section open.
    matches!(
        e.raw_os_error(),
        Some(5) | Some(21) | Some(32) | Some(33) | Some(225) | Some(433) | Some(1006) | Some(1117) | Some(1224)
    ) || e.kind() == io::ErrorKind::Interrupted
}

/// Run `op` until it succeeds, fails permanently, or `tries` is exhausted.
/// The delay grows linearly with the attempt number.
fn with_backoff<T>(tries: usize, delay_ms: u64, mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut last_err = None;
    for i in 0..tries.max(1) {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if is_retriable_io_error(&e) => {
                last_err = Some(e);
                sleep(Duration::from_millis(delay_ms.saturating_mul((i + 1) as u64)));
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "retries exhausted")))
}

pub fn open_with_backoff(path: &Path) -> io::Result<File> {
    with_backoff(TRIES, DELAY_MS, || File::open(path))
}

pub fn create_with_backoff(path: &Path) -> io::Result<File> {
    with_backoff(TRIES, DELAY_MS, || File::create(path))
}

/// Remove a file; a missing file counts as success.
pub fn remove_quietly(path: &Path) -> Result<()> {
    match with_backoff(TRIES, DELAY_MS, || fs::remove_file(path)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
    }
}

/// Move `tmp` over `dest`. Falls back to copy + remove when rename is refused
/// (e.g. across volumes).
pub fn promote_file(tmp: &Path, dest: &Path) -> Result<()> {
    if dest.exists() {
        remove_quietly(dest)?;
    }
    if with_backoff(TRIES, DELAY_MS, || fs::rename(tmp, dest)).is_ok() {
        return Ok(());
    }
    with_backoff(TRIES, DELAY_MS, || fs::copy(tmp, dest))
        .with_context(|| format!("copy {} -> {}", tmp.display(), dest.display()))?;
    remove_quietly(tmp)
}

/// Sibling temp path used while an output is being written: `<name>.part`.
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}
