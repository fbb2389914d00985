//! Byte access to a container, in memory or on disk
//!
//! All extent arithmetic happens in `u64`. Container offsets are 32-bit on
//! disk, so an extent ending past `u32::MAX` is rejected before anything is
//! narrowed to `usize`.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{Error, Result};

/// Largest address a container can refer to.
pub const MAX_CONTAINER_OFFSET: u64 = u32::MAX as u64;

/// Backing bytes of a container.
#[derive(Debug)]
pub enum ContainerStorage {
    /// The whole container read into memory.
    Memory(Vec<u8>),
    /// Metadata-only mode: ranges are read from the file on demand.
    File {
        path: PathBuf,
        file: Mutex<File>,
        len: u64,
    },
}

impl ContainerStorage {
    /// Read an entire file into memory.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::Memory(std::fs::read(path)?))
    }

    /// Open a file for on-demand range reads.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self::File {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            len,
        })
    }

    #[must_use]
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self::Memory(data)
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        match self {
            Self::Memory(data) => data.len() as u64,
            Self::File { len, .. } => *len,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory(_))
    }

    /// Read `size` bytes at `offset`.
    ///
    /// # Errors
    /// Returns [`Error::OverflowDetected`] when `offset + size` leaves the
    /// 32-bit container address range, [`Error::BoundsViolation`] when the
    /// extent ends past the container, or an IO error.
    pub fn read_range(&self, section: &'static str, offset: u64, size: u64) -> Result<Vec<u8>> {
        let (start, len) = self.checked_extent(section, offset, size)?;
        match self {
            Self::Memory(data) => Ok(data[start..start + len].to_vec()),
            Self::File { file, .. } => {
                let mut buf = vec![0u8; len];
                let mut file = file.lock();
                file.seek(SeekFrom::Start(offset))?;
                file.read_exact(&mut buf)?;
                Ok(buf)
            }
        }
    }

    /// Read up to `size` bytes from the start, for header sniffing.
    ///
    /// # Errors
    /// Returns an IO error if the read fails.
    pub fn read_prefix(&self, size: u64) -> Result<Vec<u8>> {
        self.read_range("header", 0, size.min(self.len()))
    }

    /// Validate an extent and narrow it to `usize`.
    fn checked_extent(&self, section: &'static str, offset: u64, size: u64) -> Result<(usize, usize)> {
        let overflow = || Error::OverflowDetected { offset, size };
        let end = offset.checked_add(size).ok_or_else(overflow)?;
        if end > MAX_CONTAINER_OFFSET {
            return Err(overflow());
        }
        let limit = self.len();
        if end > limit {
            return Err(Error::bounds(section, end, limit));
        }
        let start = usize::try_from(offset).map_err(|_| overflow())?;
        let len = usize::try_from(size).map_err(|_| overflow())?;
        Ok((start, len))
    }

    /// Path of the backing file, when there is one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Memory(_) => None,
            Self::File { path, .. } => Some(path),
        }
    }
}
