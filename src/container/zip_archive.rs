use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::PyramidError;

use super::{Compression, TileSink};

/// Writes tiles as entries of a single ZIP archive.
///
/// `lzma` entries use the XZ method (95): an LZMA2 stream in an xz
/// container, which the zip crate can write. Method 14 is read-only there.
pub struct ZipSink {
    writer: ZipWriter<BufWriter<File>>,
    options: SimpleFileOptions,
}

impl ZipSink {
    /// Create (or truncate) the archive at `path`.
    pub fn create(path: &Path, compression: Compression) -> Result<Self, PyramidError> {
        let method = compression_method(compression)?;
        let file = File::create(path)?;
        Ok(Self {
            writer: ZipWriter::new(BufWriter::new(file)),
            options: SimpleFileOptions::default().compression_method(method),
        })
    }
}

fn compression_method(compression: Compression) -> Result<CompressionMethod, PyramidError> {
    match compression {
        Compression::None => Ok(CompressionMethod::Stored),
        Compression::Deflate => Ok(CompressionMethod::Deflated),
        Compression::Bz2 => Ok(CompressionMethod::Bzip2),
        Compression::Lzma => Ok(CompressionMethod::Xz),
        Compression::Gzip => Err(PyramidError::Config(
            "zip container does not support 'gzip' compression".to_string(),
        )),
    }
}

impl TileSink for ZipSink {
    fn write_tile(&mut self, path: &str, data: &[u8]) -> Result<(), PyramidError> {
        self.writer.start_file(path, self.options)?;
        self.writer.write_all(data)?;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<(), PyramidError> {
        let mut inner = self.writer.finish()?;
        inner.flush()?;
        Ok(())
    }
}
