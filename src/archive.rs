//! Archive Reader: open one dump file with the decoder picked by its suffix and
//! pull UTF-8 lines from it one at a time. Nothing is buffered beyond the
//! `BufReader` window, so multi-gigabyte archives stream in constant memory.

use crate::codec::{BoxedRead, Codec, CodecRegistry};
use crate::error::ArchiveError;
use crate::util::open_with_backoff;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

pub const DEFAULT_READ_BUF: usize = 256 * 1024;

/// A `Read` wrapper that counts compressed bytes pulled from disk.
struct CountingReader<R: Read> {
    inner: R,
    counter: Arc<AtomicU64>,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.counter.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}

pub struct ArchiveReader {
    path: PathBuf,
    codec: Codec,
    reader: Box<dyn BufRead + Send>,
    compressed: Arc<AtomicU64>,
    lines: u64,
    done: bool,
}

impl ArchiveReader {
    /// Open with the standard codec table.
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        Self::open_with(path, &CodecRegistry::standard(), DEFAULT_READ_BUF)
    }

    pub fn open_with(path: &Path, registry: &CodecRegistry, read_buf_bytes: usize) -> Result<Self, ArchiveError> {
        let file = open_with_backoff(path).map_err(|e| ArchiveError::on_open(path, e))?;
        let codec = registry.resolve(path)?;

        let compressed = Arc::new(AtomicU64::new(0));
        let counted: BoxedRead = Box::new(CountingReader { inner: file, counter: compressed.clone() });
        let decoded = codec
            .wrap(counted)
            .map_err(|e| ArchiveError::Decode { path: path.to_path_buf(), source: e })?;
        let reader = BufReader::with_capacity(read_buf_bytes.max(8 * 1024), decoded);

        tracing::debug!("opened {} ({})", path.display(), codec.name());
        Ok(Self {
            path: path.to_path_buf(),
            codec,
            reader: Box::new(reader),
            compressed,
            lines: 0,
            done: false,
        })
    }

    /// Read the next line into `buf` without its `\r?\n` terminator.
    /// Returns `Ok(false)` at end of stream.
    pub fn read_line(&mut self, buf: &mut String) -> Result<bool, ArchiveError> {
        buf.clear();
        if self.done {
            return Ok(false);
        }
        let n = match self.reader.read_line(buf) {
            Ok(n) => n,
            Err(e) => {
                self.done = true;
                return Err(ArchiveError::Io { path: self.path.clone(), source: e });
            }
        };
        if n == 0 {
            self.done = true;
            return Ok(false);
        }
        if buf.ends_with('\n') {
            buf.pop();
            if buf.ends_with('\r') {
                buf.pop();
            }
        }
        self.lines += 1;
        Ok(true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Compressed bytes consumed so far (drives byte progress bars).
    pub fn compressed_bytes_read(&self) -> u64 {
        self.compressed.load(Ordering::Relaxed)
    }

    pub fn lines_read(&self) -> u64 {
        self.lines
    }
}

/// Lazy line sequence. Stops after the first error.
impl Iterator for ArchiveReader {
    type Item = Result<String, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = String::new();
        match self.read_line(&mut buf) {
            Ok(true) => Some(Ok(buf)),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
