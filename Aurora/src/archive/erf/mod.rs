//! ERF-family archives (ERF, HAK, MOD, SAV, NWM)
//!
//! Layout: a 160-byte header, localized description strings, a key list
//! (resref, id, type) and a resource list (offset, size) in the same order,
//! followed by resource data.

mod reader;
mod writer;

use serde::{Deserialize, Serialize};

pub use reader::ErfArchive;
pub use writer::ErfWriter;

/// Header size for both versions.
pub const ERF_HEADER_SIZE: usize = 160;
/// Resource list entry: offset, size.
pub const RESOURCE_ENTRY_SIZE: usize = 8;

/// Archive flavour, from the first four bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErfType {
    Erf,
    Hak,
    Mod,
    Sav,
    Nwm,
}

impl ErfType {
    #[must_use]
    pub fn from_magic(magic: &[u8]) -> Option<Self> {
        Some(match magic {
            b"ERF " => Self::Erf,
            b"HAK " => Self::Hak,
            b"MOD " => Self::Mod,
            b"SAV " => Self::Sav,
            b"NWM " => Self::Nwm,
            _ => return None,
        })
    }

    #[must_use]
    pub fn magic(self) -> &'static [u8; 4] {
        match self {
            Self::Erf => b"ERF ",
            Self::Hak => b"HAK ",
            Self::Mod => b"MOD ",
            Self::Sav => b"SAV ",
            Self::Nwm => b"NWM ",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Erf => "ERF",
            Self::Hak => "HAK",
            Self::Mod => "MOD",
            Self::Sav => "SAV",
            Self::Nwm => "NWM",
        }
    }
}

/// Key-list layout version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErfVersion {
    /// 16-byte resrefs, 24-byte keys.
    #[default]
    V1_0,
    /// 32-byte resrefs, 40-byte keys.
    V1_1,
}

impl ErfVersion {
    #[must_use]
    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"V1.0" => Some(Self::V1_0),
            b"V1.1" => Some(Self::V1_1),
            _ => None,
        }
    }

    #[must_use]
    pub fn tag(self) -> &'static [u8; 4] {
        match self {
            Self::V1_0 => b"V1.0",
            Self::V1_1 => b"V1.1",
        }
    }

    #[must_use]
    pub fn resref_len(self) -> usize {
        match self {
            Self::V1_0 => crate::formats::common::RESREF_MAX_LEN,
            Self::V1_1 => crate::formats::common::RESREF_MAX_LEN_V11,
        }
    }

    /// resref + id (u32) + type (u16) + unused (u16)
    #[must_use]
    pub fn key_entry_size(self) -> usize {
        self.resref_len() + 8
    }
}
