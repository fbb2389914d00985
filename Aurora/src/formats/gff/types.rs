//! GFF V3.2 on-disk records and field type tags

use crate::error::{Error, Result};

/// Magic version tag.
pub const GFF_VERSION: &[u8; 4] = b"V3.2";

/// Header size: two tags plus six (offset, count) pairs.
pub const HEADER_SIZE: usize = 56;
/// Struct record: type, data-or-offset, field count.
pub const STRUCT_RECORD_SIZE: usize = 12;
/// Field record: type, label index, data-or-offset.
pub const FIELD_RECORD_SIZE: usize = 12;
/// Fixed label width.
pub const LABEL_SIZE: usize = 16;

/// Struct record `DataOrDataOffset` written for structs without fields.
pub const EMPTY_STRUCT_DATA: u32 = 0xFFFF_FFFF;

/// Field type tag as stored in a field record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum FieldType {
    Byte = 0,
    Char = 1,
    Word = 2,
    Short = 3,
    Dword = 4,
    Int = 5,
    Dword64 = 6,
    Int64 = 7,
    Float = 8,
    Double = 9,
    ExoString = 10,
    ResRef = 11,
    ExoLocString = 12,
    Void = 13,
    Struct = 14,
    List = 15,
    Orientation = 16,
    Vector = 17,
}

impl FieldType {
    /// Decode a type tag.
    ///
    /// # Errors
    /// Returns [`Error::UnknownFieldType`] for tags outside 0..=17.
    pub fn from_u32(value: u32) -> Result<Self> {
        Ok(match value {
            0 => Self::Byte,
            1 => Self::Char,
            2 => Self::Word,
            3 => Self::Short,
            4 => Self::Dword,
            5 => Self::Int,
            6 => Self::Dword64,
            7 => Self::Int64,
            8 => Self::Float,
            9 => Self::Double,
            10 => Self::ExoString,
            11 => Self::ResRef,
            12 => Self::ExoLocString,
            13 => Self::Void,
            14 => Self::Struct,
            15 => Self::List,
            16 => Self::Orientation,
            17 => Self::Vector,
            other => return Err(Error::UnknownFieldType(other)),
        })
    }

    #[must_use]
    pub fn id(self) -> u32 {
        self as u32
    }

    /// Whether the value fits in the record's 4-byte data slot.
    #[must_use]
    pub fn is_inline(self) -> bool {
        matches!(
            self,
            Self::Byte | Self::Char | Self::Word | Self::Short | Self::Dword | Self::Int | Self::Float
        )
    }

    /// Interpret a record's raw data slot for this type.
    #[must_use]
    pub fn storage(self, raw: u32) -> FieldStorage {
        match self {
            Self::Struct => FieldStorage::StructIndex(raw),
            Self::List => FieldStorage::ListOffset(raw),
            t if t.is_inline() => FieldStorage::Inline(raw),
            _ => FieldStorage::FieldData(raw),
        }
    }
}

/// What a field record's `DataOrDataOffset` slot means.
///
/// Struct fields hold a struct *index*, never a byte offset; keeping the
/// four cases apart means each decode branch can only see the meaning
/// that applies to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStorage {
    /// Value stored directly in the slot, zero-extended.
    Inline(u32),
    /// Byte offset into the FieldData section.
    FieldData(u32),
    /// Index into the Structs section.
    StructIndex(u32),
    /// Byte offset into the ListIndices section.
    ListOffset(u32),
}

impl FieldStorage {
    /// The raw slot value, for writing.
    #[must_use]
    pub fn raw(self) -> u32 {
        match self {
            Self::Inline(v) | Self::FieldData(v) | Self::StructIndex(v) | Self::ListOffset(v) => v,
        }
    }
}

/// Struct record as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawStruct {
    pub struct_type: u32,
    pub data_or_offset: u32,
    pub field_count: u32,
}

/// Field record as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawField {
    pub field_type: FieldType,
    pub label_index: u32,
    pub storage: FieldStorage,
}

/// One (offset, count) pair of the header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SectionInfo {
    pub offset: u32,
    pub count: u32,
}

/// Decoded 56-byte header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GffHeader {
    pub file_type: [u8; 4],
    pub version: [u8; 4],
    pub structs: SectionInfo,
    pub fields: SectionInfo,
    pub labels: SectionInfo,
    /// `count` is a byte length.
    pub field_data: SectionInfo,
    /// `count` is a byte length.
    pub field_indices: SectionInfo,
    /// `count` is a byte length.
    pub list_indices: SectionInfo,
}
