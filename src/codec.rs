//! Suffix → streaming decoder table. Resolved once per file open; callers can
//! register extra codecs or mark suffixes as known-but-undecodable.

use crate::error::ArchiveError;
use ahash::{AHashMap, AHashSet};
use flate2::read::MultiGzDecoder;
use std::fmt;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use xz2::read::XzDecoder;

pub type BoxedRead = Box<dyn Read + Send>;
pub type DecoderFn = Arc<dyn Fn(BoxedRead) -> io::Result<BoxedRead> + Send + Sync>;

/// A streaming decoder strategy.
#[derive(Clone)]
pub enum Codec {
    Plain,
    Gzip,
    Xz,
    /// zstd with `window_log_max(31)`; monthly dumps use long windows.
    Zstd,
    Custom(DecoderFn),
}

impl Codec {
    pub fn custom(f: impl Fn(BoxedRead) -> io::Result<BoxedRead> + Send + Sync + 'static) -> Self {
        Codec::Custom(Arc::new(f))
    }

    /// Wrap a raw byte stream in this codec's decoder.
    pub fn wrap(&self, inner: BoxedRead) -> io::Result<BoxedRead> {
        match self {
            Codec::Plain => Ok(inner),
            Codec::Gzip => Ok(Box::new(MultiGzDecoder::new(inner))),
            Codec::Xz => Ok(Box::new(XzDecoder::new_multi_decoder(inner))),
            Codec::Zstd => {
                let mut dec = zstd::stream::read::Decoder::new(inner)?;
                dec.window_log_max(31)?;
                Ok(Box::new(dec))
            }
            Codec::Custom(f) => f(inner),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Codec::Plain => "plain",
            Codec::Gzip => "gzip",
            Codec::Xz => "xz",
            Codec::Zstd => "zstd",
            Codec::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Injectable suffix table. Suffixes are compared lower-cased and without the dot.
#[derive(Clone, Debug)]
pub struct CodecRegistry {
    codecs: AHashMap<String, Codec>,
    unsupported: AHashSet<String>,
    force_plain_text: bool,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn norm_suffix(s: &str) -> String {
    s.trim().trim_start_matches('.').to_lowercase()
}

impl CodecRegistry {
    /// gz, xz and zst decoders; bz2, lz4 and 7z are recognized but refused.
    pub fn standard() -> Self {
        Self::empty()
            .with_codec("gz", Codec::Gzip)
            .with_codec("xz", Codec::Xz)
            .with_codec("zst", Codec::Zstd)
            .mark_unsupported("bz2")
            .mark_unsupported("lz4")
            .mark_unsupported("7z")
    }

    /// Everything reads as plain text.
    pub fn empty() -> Self {
        Self { codecs: AHashMap::new(), unsupported: AHashSet::new(), force_plain_text: false }
    }

    pub fn with_codec(mut self, suffix: &str, codec: Codec) -> Self {
        let s = norm_suffix(suffix);
        self.unsupported.remove(&s);
        self.codecs.insert(s, codec);
        self
    }

    pub fn mark_unsupported(mut self, suffix: &str) -> Self {
        let s = norm_suffix(suffix);
        self.codecs.remove(&s);
        self.unsupported.insert(s);
        self
    }

    /// Read refused suffixes as plain text instead of failing.
    pub fn force_plain_text(mut self, yes: bool) -> Self {
        self.force_plain_text = yes;
        self
    }

    /// Pick the codec for `path` from its last extension.
    pub fn resolve(&self, path: &Path) -> Result<Codec, ArchiveError> {
        let suffix = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => norm_suffix(ext),
            None => return Ok(Codec::Plain),
        };
        if let Some(c) = self.codecs.get(&suffix) {
            return Ok(c.clone());
        }
        if self.unsupported.contains(&suffix) {
            if self.force_plain_text {
                tracing::warn!(
                    "reading {} as plain text although '.{}' is compressed",
                    path.display(),
                    suffix
                );
                return Ok(Codec::Plain);
            }
            return Err(ArchiveError::UnsupportedFormat { path: path.to_path_buf(), suffix });
        }
        Ok(Codec::Plain)
    }
}
