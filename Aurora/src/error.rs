//! Error types for `Aurora`

use std::path::PathBuf;

use thiserror::Error;

/// Broad failure classes shared by every reader and codec.
///
/// Callers that only need to tell "the file is broken" apart from
/// "the disk is broken" can match on this instead of the full [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Header mismatch, bad magic, unknown type tag or truncated header.
    MalformedInput,
    /// An offset or index points outside its target section.
    BoundsViolation,
    /// Offset arithmetic would leave the addressable range.
    OverflowDetected,
    /// Underlying filesystem failure.
    Io,
    /// JSON or other serialization failure.
    Serialization,
}

/// The error type for `Aurora` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Shared Binary Errors ====================
    /// The file does not start with the expected four-character tag.
    #[error("invalid {format} magic: found {found:?}")]
    InvalidMagic {
        /// Format being decoded.
        format: &'static str,
        /// The four bytes found at the start of the file.
        found: [u8; 4],
    },

    /// The format version is not supported.
    #[error("unsupported {format} version: {version:?}")]
    UnsupportedVersion {
        /// Format being decoded.
        format: &'static str,
        /// The version tag found in the file.
        version: String,
    },

    /// The buffer ends before a fixed-size header could be read.
    #[error("truncated {format} header: need {needed} bytes, have {available}")]
    TruncatedHeader {
        /// Format being decoded.
        format: &'static str,
        /// Bytes required.
        needed: usize,
        /// Bytes present.
        available: usize,
    },

    /// An offset or index lies outside the section it refers to.
    #[error("{section}: offset {offset} outside limit {limit}")]
    BoundsViolation {
        /// Name of the section being addressed.
        section: &'static str,
        /// Offending offset (or index).
        offset: u64,
        /// Section extent.
        limit: u64,
    },

    /// `offset + size` cannot be represented in the container's address range.
    #[error("offset {offset:#x} + size {size:#x} overflows the addressable range")]
    OverflowDetected {
        /// Start offset of the extent.
        offset: u64,
        /// Length of the extent.
        size: u64,
    },

    // ==================== GFF Errors ====================
    /// A field record carries a type id outside the known set.
    #[error("unknown GFF field type: {0}")]
    UnknownFieldType(u32),

    /// A struct is reachable from itself.
    #[error("GFF struct {0} is referenced recursively")]
    GffStructCycle(u32),

    /// A struct has more than one parent.
    #[error("GFF struct {0} is referenced more than once")]
    GffStructShared(u32),

    /// Struct nesting goes deeper than the decoder allows.
    #[error("GFF struct {index} is nested deeper than {limit} levels")]
    GffNestingTooDeep {
        /// Struct reached past the limit.
        index: u32,
        /// Maximum nesting depth.
        limit: usize,
    },

    /// A value does not fit the on-disk representation.
    #[error("GFF value for '{label}' is too large: {reason}")]
    GffValueTooLarge {
        /// Field label.
        label: String,
        /// What exceeded which limit.
        reason: String,
    },

    /// A section grew beyond the 32-bit offsets the format can express.
    #[error("GFF {section} section exceeds 4 GiB")]
    GffSectionTooLarge {
        /// Section name.
        section: &'static str,
    },

    /// A traversal strategy skipped or repeated a struct.
    #[error("GFF traversal numbered {numbered} of {expected} structs")]
    GffTraversal {
        /// Structs in the numbering.
        numbered: usize,
        /// Structs in the tree.
        expected: usize,
    },

    // ==================== ResRef Errors ====================
    /// A resource name exceeds the fixed-width slot.
    #[error("resref '{name}' exceeds {max} characters")]
    ResRefTooLong {
        /// The offending name.
        name: String,
        /// Maximum allowed length.
        max: usize,
    },

    // ==================== 2DA Errors ====================
    /// The first line is not a `2DA V2.0` header.
    #[error("invalid 2DA header: {0:?}")]
    InvalidTwoDaHeader(String),

    /// The table has no column-name line.
    #[error("2DA table has no column header")]
    TwoDaMissingColumns,

    /// A data row has the wrong number of cells.
    #[error("2DA line {line}: expected {expected} cells, found {found}")]
    TwoDaMalformedRow {
        /// 1-based line number.
        line: usize,
        /// Number of columns declared.
        expected: usize,
        /// Number of cells present.
        found: usize,
    },

    // ==================== Archive Errors ====================
    /// The container type could not be determined from its magic.
    #[error("unrecognised container: {path}")]
    UnknownContainer {
        /// Path to the container.
        path: PathBuf,
    },

    /// A KEY file references a BIF that is not on disk.
    #[error("BIF file not found: {path}")]
    BifMissing {
        /// Expected path of the BIF.
        path: PathBuf,
    },

    /// Too many resources or BIFs for the packed resource id.
    #[error("archive too large: {0}")]
    ArchiveTooLarge(String),

    // ==================== Parsing Errors ====================
    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A JSON document does not describe a valid GFF tree.
    #[error("invalid GFF JSON: {0}")]
    InvalidGffJson(String),

    // ==================== File System Errors ====================
    /// Invalid file path.
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

impl Error {
    /// Map this error onto the broad failure classes.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::BoundsViolation { .. } => ErrorKind::BoundsViolation,
            Error::OverflowDetected { .. } => ErrorKind::OverflowDetected,
            Error::JsonError(_) | Error::InvalidGffJson(_) => ErrorKind::Serialization,
            _ => ErrorKind::MalformedInput,
        }
    }

    /// Shorthand for building a [`Error::BoundsViolation`].
    pub(crate) fn bounds(section: &'static str, offset: u64, limit: u64) -> Self {
        Error::BoundsViolation {
            section,
            offset,
            limit,
        }
    }
}

// Persisting a temp file surfaces the underlying IO error.
impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io(err.error)
    }
}

/// A specialized Result type for `Aurora` operations.
pub type Result<T> = std::result::Result<T, Error>;
