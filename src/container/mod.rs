//! Output containers for a dumped pyramid.
//!
//! A pyramid is written either as a directory tree or as a single archive.
//! Every container is a [`TileSink`]: tiles are handed over one at a time,
//! in canonical order, by a single writer.
//!
//! # Compression Matrix
//!
//! | Container | Accepted compression            |
//! |-----------|---------------------------------|
//! | directory | none                            |
//! | zip       | none, deflate, bz2, lzma (xz)   |
//! | tar       | none, gzip, bz2, lzma (xz)      |
//!
//! The pair is checked by [`ContainerSpec::new`] so an invalid combination
//! fails before anything is rendered or created on disk.

mod directory;
mod tar_archive;
mod zip_archive;

pub use directory::DirectorySink;
pub use tar_archive::TarSink;
pub use zip_archive::ZipSink;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::PyramidError;
use crate::tile::TileFormat;

// =============================================================================
// Container Kind
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContainerKind {
    /// One file per tile under a destination directory
    #[default]
    Directory,

    /// A single ZIP archive
    Zip,

    /// A single TAR archive
    Tar,
}

impl ContainerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerKind::Directory => "dir",
            ContainerKind::Zip => "zip",
            ContainerKind::Tar => "tar",
        }
    }

    /// Compression schemes this container can apply.
    pub fn supported_compressions(&self) -> &'static [Compression] {
        match self {
            ContainerKind::Directory => &[Compression::None],
            ContainerKind::Zip => &[
                Compression::None,
                Compression::Deflate,
                Compression::Bz2,
                Compression::Lzma,
            ],
            ContainerKind::Tar => &[
                Compression::None,
                Compression::Gzip,
                Compression::Bz2,
                Compression::Lzma,
            ],
        }
    }
}

impl FromStr for ContainerKind {
    type Err = PyramidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dir" | "directory" | "folder" => Ok(ContainerKind::Directory),
            "zip" => Ok(ContainerKind::Zip),
            "tar" => Ok(ContainerKind::Tar),
            other => Err(PyramidError::Config(format!(
                "unsupported container '{}' (expected dir, zip or tar)",
                other
            ))),
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Compression
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Compression {
    #[default]
    None,
    Deflate,
    Gzip,
    Bz2,
    Lzma,
}

impl Compression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Deflate => "deflate",
            Compression::Gzip => "gzip",
            Compression::Bz2 => "bz2",
            Compression::Lzma => "lzma",
        }
    }
}

impl FromStr for Compression {
    type Err = PyramidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "stored" => Ok(Compression::None),
            "deflate" | "deflated" => Ok(Compression::Deflate),
            "gzip" | "gz" => Ok(Compression::Gzip),
            "bz2" | "bzip2" => Ok(Compression::Bz2),
            "lzma" | "xz" => Ok(Compression::Lzma),
            other => Err(PyramidError::Config(format!(
                "unsupported compression '{}' (expected none, deflate, gzip, bz2 or lzma)",
                other
            ))),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Container Spec
// =============================================================================

/// A validated (container, compression) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContainerSpec {
    kind: ContainerKind,
    compression: Compression,
}

impl ContainerSpec {
    /// Validate a (container, compression) pair.
    ///
    /// # Errors
    ///
    /// Returns [`PyramidError::Config`] when the container does not support
    /// the compression.
    pub fn new(kind: ContainerKind, compression: Compression) -> Result<Self, PyramidError> {
        if !kind.supported_compressions().contains(&compression) {
            let supported: Vec<&str> = kind
                .supported_compressions()
                .iter()
                .map(|c| c.as_str())
                .collect();
            return Err(PyramidError::Config(format!(
                "{} container does not support '{}' compression (supported: {})",
                kind,
                compression,
                supported.join(", ")
            )));
        }
        Ok(Self { kind, compression })
    }

    /// Parse and validate a pair of names. `None` means directory and no
    /// compression respectively.
    pub fn from_names(
        container: Option<&str>,
        compression: Option<&str>,
    ) -> Result<Self, PyramidError> {
        let kind = container.map(str::parse).transpose()?.unwrap_or_default();
        let compression = compression.map(str::parse).transpose()?.unwrap_or_default();
        Self::new(kind, compression)
    }

    /// Plain directory output.
    pub fn directory() -> Self {
        Self::default()
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Encoding of the tile stored at `path`.
    ///
    /// Archives always hold JPEG; directories follow the path's extension.
    pub fn tile_format(&self, path: &str) -> Result<TileFormat, PyramidError> {
        match self.kind {
            ContainerKind::Directory => TileFormat::from_path(path),
            ContainerKind::Zip | ContainerKind::Tar => Ok(TileFormat::Jpeg),
        }
    }

    /// Create the container at `destination`.
    pub fn open(&self, destination: &Path) -> Result<Box<dyn TileSink>, PyramidError> {
        let sink: Box<dyn TileSink> = match self.kind {
            ContainerKind::Directory => Box::new(DirectorySink::create(destination)?),
            ContainerKind::Zip => Box::new(ZipSink::create(destination, self.compression)?),
            ContainerKind::Tar => Box::new(TarSink::create(destination, self.compression)?),
        };
        Ok(sink)
    }
}

impl fmt::Display for ContainerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.compression)
    }
}

// =============================================================================
// TileSink Trait
// =============================================================================

/// Destination receiving encoded tiles.
///
/// Sinks are not shared: a single task writes every tile, then calls
/// [`TileSink::finish`]. A sink dropped without `finish` releases its file
/// handles, but archives are left incomplete.
pub trait TileSink: Send {
    /// Store `data` at the relative `path` (`/`-separated).
    fn write_tile(&mut self, path: &str, data: &[u8]) -> Result<(), PyramidError>;

    /// Flush and finalize the container.
    fn finish(self: Box<Self>) -> Result<(), PyramidError>;
}
