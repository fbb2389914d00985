//! Primary/custom talk-table pair and StrRef routing

use super::{TalkTable, TlkEntry};

/// StrRefs at or above this value address the custom table.
pub const CUSTOM_TLK_OFFSET: u32 = 0x0100_0000;

/// No string.
const INVALID_STRREF: u32 = 0xFFFF_FFFF;

/// Which table a StrRef addresses, and the index inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrRefRoute {
    Primary(u32),
    Custom(u32),
}

impl StrRefRoute {
    /// Route a StrRef; `0xFFFFFFFF` routes nowhere.
    #[must_use]
    pub fn of(str_ref: u32) -> Option<Self> {
        match str_ref {
            INVALID_STRREF => None,
            r if r >= CUSTOM_TLK_OFFSET => Some(Self::Custom(r - CUSTOM_TLK_OFFSET)),
            r => Some(Self::Primary(r)),
        }
    }
}

/// The game's `dialog.tlk` plus an optional module table.
///
/// The two tables are separate namespaces: a custom StrRef missing from
/// the custom table is not looked up in the primary one.
#[derive(Debug, Clone, Default)]
pub struct TalkTableSet {
    pub primary: Option<TalkTable>,
    pub custom: Option<TalkTable>,
}

impl TalkTableSet {
    #[must_use]
    pub fn new(primary: TalkTable, custom: Option<TalkTable>) -> Self {
        Self {
            primary: Some(primary),
            custom,
        }
    }

    #[must_use]
    pub fn get(&self, str_ref: u32) -> Option<&TlkEntry> {
        match StrRefRoute::of(str_ref)? {
            StrRefRoute::Primary(index) => self.primary.as_ref()?.get(index),
            StrRefRoute::Custom(index) => self.custom.as_ref()?.get(index),
        }
    }

    #[must_use]
    pub fn text(&self, str_ref: u32) -> Option<&str> {
        self.get(str_ref)?.text.as_deref()
    }
}
