use crate::codec::{BoxedRead, CodecRegistry};
use crate::concurrency::map_limited;
use crate::error::ArchiveError;
use crate::progress::make_count_progress;
use crate::util::open_with_backoff;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Mode for integrity checks.
#[derive(Clone, Copy, Debug)]
pub enum IntegrityMode {
    /// Decode only the first `sample_bytes` (decompressed) per file.
    /// Fast and catches early corruption; cannot detect trailing corruption.
    Quick { sample_bytes: u64 },
    /// Decode the entire stream; validates checksums where the codec has them.
    Full,
}

fn decode_sample(path: &Path, mode: IntegrityMode, registry: &CodecRegistry) -> Result<u64, ArchiveError> {
    let file = open_with_backoff(path).map_err(|e| ArchiveError::on_open(path, e))?;
    let codec = registry.resolve(path)?;
    let raw: BoxedRead = Box::new(file);
    let mut decoded = codec
        .wrap(raw)
        .map_err(|e| ArchiveError::Decode { path: path.to_path_buf(), source: e })?;
    let copied = match mode {
        IntegrityMode::Quick { sample_bytes } => io::copy(&mut (&mut decoded).take(sample_bytes), &mut io::sink()),
        IntegrityMode::Full => io::copy(&mut decoded, &mut io::sink()),
    };
    copied.map_err(|e| ArchiveError::Io { path: path.to_path_buf(), source: e })
}

/// Decode each archive (fully or a prefix) and report the ones that fail as
/// `(path, error_message)`, in input order. Missing files and refused formats
/// are reported too.
pub fn check_archives(
    paths: &[PathBuf],
    mode: IntegrityMode,
    registry: &CodecRegistry,
    file_concurrency: usize,
    progress: bool,
) -> Vec<(PathBuf, String)> {
    let label = match mode {
        IntegrityMode::Quick { .. } => "Integrity (quick)",
        IntegrityMode::Full => "Integrity (full)",
    };
    let pb = if progress { Some(make_count_progress(paths.len() as u64, label)) } else { None };

    let results = map_limited(paths, file_concurrency, |_, path| {
        let res = decode_sample(path, mode, registry);
        if let Some(pb) = &pb {
            pb.inc(1);
        }
        match res {
            Ok(bytes) => {
                tracing::debug!("{} ok ({} bytes decoded)", path.display(), bytes);
                None
            }
            Err(e) => {
                tracing::warn!("integrity check failed for {}: {}", path.display(), e);
                Some((path.clone(), e.to_string()))
            }
        }
    });

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }
    results.into_iter().flatten().collect()
}
