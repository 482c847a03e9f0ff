//! Typed failures for archive access. Glue code wraps these in `anyhow` with context.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("archive not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("unsupported compression '.{suffix}' for {} (set force_plain_text to read it as text)", path.display())]
    UnsupportedFormat { path: PathBuf, suffix: String },

    #[error("read failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("decoder setup failed for {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write output {}: {source}", path.display())]
    OutputUnwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("operation cancelled")]
    Cancelled,
}

impl ArchiveError {
    /// Map an `open` failure to `FileNotFound` when that is what happened.
    pub(crate) fn on_open(path: &std::path::Path, e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::NotFound {
            ArchiveError::FileNotFound { path: path.to_path_buf() }
        } else {
            ArchiveError::Io { path: path.to_path_buf(), source: e }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ArchiveError::FileNotFound { .. })
    }
}
