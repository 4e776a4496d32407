use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use bzip2::write::BzEncoder;
use flate2::write::GzEncoder;
use tar::{Builder, EntryType, Header};
use xz2::write::XzEncoder;

use crate::error::PyramidError;

use super::{Compression, TileSink};

/// xz preset used for `lzma` TAR output.
const XZ_PRESET: u32 = 6;

// =============================================================================
// Compressed Writer
// =============================================================================

/// Byte stream under the TAR builder, optionally compressed.
enum TarWriter {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
    Bzip2(BzEncoder<BufWriter<File>>),
    Xz(XzEncoder<BufWriter<File>>),
}

impl TarWriter {
    fn new(file: File, compression: Compression) -> Result<Self, PyramidError> {
        let inner = BufWriter::new(file);
        match compression {
            Compression::None => Ok(TarWriter::Plain(inner)),
            Compression::Gzip => Ok(TarWriter::Gzip(GzEncoder::new(
                inner,
                flate2::Compression::default(),
            ))),
            Compression::Bz2 => Ok(TarWriter::Bzip2(BzEncoder::new(
                inner,
                bzip2::Compression::default(),
            ))),
            Compression::Lzma => Ok(TarWriter::Xz(XzEncoder::new(inner, XZ_PRESET))),
            Compression::Deflate => Err(PyramidError::Config(
                "tar container does not support 'deflate' compression".to_string(),
            )),
        }
    }

    /// Write the compression trailer and flush the file.
    fn finish(self) -> io::Result<()> {
        let mut inner = match self {
            TarWriter::Plain(w) => w,
            TarWriter::Gzip(w) => w.finish()?,
            TarWriter::Bzip2(w) => w.finish()?,
            TarWriter::Xz(w) => w.finish()?,
        };
        inner.flush()
    }
}

impl Write for TarWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            TarWriter::Plain(w) => w.write(buf),
            TarWriter::Gzip(w) => w.write(buf),
            TarWriter::Bzip2(w) => w.write(buf),
            TarWriter::Xz(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            TarWriter::Plain(w) => w.flush(),
            TarWriter::Gzip(w) => w.flush(),
            TarWriter::Bzip2(w) => w.flush(),
            TarWriter::Xz(w) => w.flush(),
        }
    }
}

// =============================================================================
// TAR Sink
// =============================================================================

/// Writes tiles as entries of a single TAR archive.
///
/// Each entry is a regular file with mode 0644 and its modification time set
/// to the moment it is written.
pub struct TarSink {
    builder: Builder<TarWriter>,
}

impl TarSink {
    /// Create (or truncate) the archive at `path`.
    pub fn create(path: &Path, compression: Compression) -> Result<Self, PyramidError> {
        let writer = TarWriter::new(File::create(path)?, compression)?;
        Ok(Self {
            builder: Builder::new(writer),
        })
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl TileSink for TarSink {
    fn write_tile(&mut self, path: &str, data: &[u8]) -> Result<(), PyramidError> {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(unix_now());
        self.builder.append_data(&mut header, path, data)?;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<(), PyramidError> {
        let writer = self.builder.into_inner()?;
        writer.finish()?;
        Ok(())
    }
}
