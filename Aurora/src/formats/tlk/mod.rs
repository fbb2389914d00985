//! TLK V3.0 talk tables
//!
//! A talk table maps StrRefs (zero-based indices) to display text and an
//! optional voice-over resource. `dialog.tlk` holds the base game strings;
//! modules may ship a custom table addressed from [`CUSTOM_TLK_OFFSET`] up.

mod reader;
mod set;
mod writer;

use serde::{Deserialize, Serialize};

use crate::formats::common::ResRef;
use crate::formats::gff::Language;

pub use reader::{parse_tlk_bytes, read_tlk};
pub use set::{CUSTOM_TLK_OFFSET, StrRefRoute, TalkTableSet};
pub use writer::{serialize_tlk, write_tlk};

/// Header: magic, version, language, count, string data offset.
pub const TLK_HEADER_SIZE: usize = 20;
/// Entry record size.
pub const TLK_ENTRY_SIZE: usize = 40;

/// Entry flag: text present.
pub const FLAG_TEXT: u32 = 0x1;
/// Entry flag: sound resref present.
pub const FLAG_SOUND: u32 = 0x2;
/// Entry flag: sound length present.
pub const FLAG_SOUND_LENGTH: u32 = 0x4;

/// A single talk-table entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TlkEntry {
    pub text: Option<String>,
    pub sound: Option<ResRef>,
    /// Voice-over duration in seconds.
    pub sound_length: Option<f32>,
    pub volume_variance: u32,
    pub pitch_variance: u32,
}

impl TlkEntry {
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Flag bits for the fields that are set.
    #[must_use]
    pub fn flags(&self) -> u32 {
        let mut flags = 0;
        if self.text.is_some() {
            flags |= FLAG_TEXT;
        }
        if self.sound.is_some() {
            flags |= FLAG_SOUND;
        }
        if self.sound_length.is_some() {
            flags |= FLAG_SOUND_LENGTH;
        }
        flags
    }
}

/// A decoded talk table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TalkTable {
    /// Raw language id from the header.
    pub language_id: u32,
    pub entries: Vec<TlkEntry>,
}

impl TalkTable {
    #[must_use]
    pub fn new(language: Language) -> Self {
        Self {
            language_id: u32::from(language as u8),
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn language(&self) -> Option<Language> {
        Language::from_id(self.language_id)
    }

    #[must_use]
    pub fn get(&self, index: u32) -> Option<&TlkEntry> {
        self.entries.get(usize::try_from(index).ok()?)
    }

    #[must_use]
    pub fn text(&self, index: u32) -> Option<&str> {
        self.get(index)?.text.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry and return its index.
    pub fn push(&mut self, entry: TlkEntry) -> u32 {
        self.entries.push(entry);
        (self.entries.len() - 1) as u32
    }
}
