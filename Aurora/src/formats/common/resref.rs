//! Resource references and the case-insensitive lookup key built from them

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ResourceType;
use crate::error::{Error, Result};

/// Maximum resref length in GFF fields, KEY tables and ERF V1.0 archives.
pub const RESREF_MAX_LEN: usize = 16;

/// Maximum resref length in ERF V1.1 archives.
pub const RESREF_MAX_LEN_V11: usize = 32;

/// A short resource name, stored exactly as written.
///
/// Comparison is exact so documents round-trip byte-for-byte; use
/// [`ResourceKey`] for engine-style case-insensitive lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResRef(String);

impl ResRef {
    /// Create a resref, rejecting names longer than [`RESREF_MAX_LEN`].
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Self::with_limit(name, RESREF_MAX_LEN)
    }

    /// Create a resref with an explicit length limit (ERF V1.1 uses 32).
    pub fn with_limit(name: impl Into<String>, max: usize) -> Result<Self> {
        let name = name.into();
        if name.len() > max {
            return Err(Error::ResRefTooLong { name, max });
        }
        Ok(Self(name))
    }

    /// Decode a NUL-padded fixed-width slot.
    #[must_use]
    pub fn from_padded(bytes: &[u8]) -> Self {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Self(super::decode_cp1252(&bytes[..end]).into_owned())
    }

    /// Encode into a NUL-padded fixed-width slot of `N` bytes.
    #[must_use]
    pub fn to_padded<const N: usize>(&self) -> [u8; N] {
        let mut slot = [0u8; N];
        let bytes = super::encode_cp1252(&self.0);
        let len = bytes.len().min(N);
        slot[..len].copy_from_slice(&bytes[..len]);
        slot
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lookup key for this name and a resource type.
    #[must_use]
    pub fn key(&self, res_type: ResourceType) -> ResourceKey {
        ResourceKey::new(&self.0, res_type)
    }
}

impl fmt::Display for ResRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// (name, type) pair with the name folded to ASCII lowercase.
///
/// Used for container indexes, the resolver's negative cache and loose
/// file probes, all of which match names case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    pub name: String,
    pub res_type: ResourceType,
}

impl ResourceKey {
    #[must_use]
    pub fn new(name: &str, res_type: ResourceType) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            res_type,
        }
    }

    /// Whether the name can be a resref: non-empty, at most
    /// [`RESREF_MAX_LEN_V11`] bytes, and free of path syntax.
    #[must_use]
    pub fn is_plain_name(&self) -> bool {
        !self.name.is_empty()
            && self.name.len() <= RESREF_MAX_LEN_V11
            && !self.name.contains("..")
            && !self.name.contains(['/', '\\', ':', '\0'])
    }

    /// Filename of the loose-file equivalent, e.g. `nw_chicken.utc`.
    ///
    /// Returns `None` for types without a known extension and for names that
    /// are not [plain](Self::is_plain_name).
    #[must_use]
    pub fn file_name(&self) -> Option<String> {
        if !self.is_plain_name() {
            return None;
        }
        self.res_type
            .extension()
            .map(|ext| format!("{}.{ext}", self.name))
    }

    /// Parse `name.ext` into a key.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (stem, ext) = file_name.rsplit_once('.')?;
        let res_type = ResourceType::from_extension(ext)?;
        Some(Self::new(stem, res_type))
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.res_type.extension() {
            Some(ext) => write!(f, "{}.{ext}", self.name),
            None => write!(f, "{}.#{}", self.name, self.res_type.id()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_limit() {
        assert!(ResRef::new("nw_it_mring001").is_ok());
        assert!(ResRef::new("abcdefghijklmnop").is_ok());
        assert!(matches!(
            ResRef::new("abcdefghijklmnopq"),
            Err(Error::ResRefTooLong { max: 16, .. })
        ));
        assert!(ResRef::with_limit("abcdefghijklmnopq", RESREF_MAX_LEN_V11).is_ok());
    }

    #[test]
    fn test_padded_roundtrip() {
        let r = ResRef::new("Chicken").unwrap();
        let slot: [u8; 16] = r.to_padded();
        assert_eq!(&slot[..8], b"Chicken\0");
        assert_eq!(ResRef::from_padded(&slot), r);
    }

    #[test]
    fn test_full_width_slot_without_nul() {
        let slot = *b"abcdefghijklmnop";
        assert_eq!(ResRef::from_padded(&slot).as_str(), "abcdefghijklmnop");
    }

    #[test]
    fn test_key_is_case_insensitive() {
        let a = ResourceKey::new("NW_Chicken", ResourceType::UTC);
        let b = ResourceKey::new("nw_chicken", ResourceType::UTC);
        assert_eq!(a, b);
        assert_eq!(a.file_name().as_deref(), Some("nw_chicken.utc"));
        assert_ne!(a, ResourceKey::new("nw_chicken", ResourceType::UTI));
    }

    #[test]
    fn test_plain_names() {
        let plain = |name: &str| ResourceKey::new(name, ResourceType::TXT).is_plain_name();
        assert!(plain("nw_chicken"));
        assert!(plain("a_rather_long_resource_name_v11"));
        assert!(!plain(""));
        assert!(!plain("../secret"));
        assert!(!plain("..\\secret"));
        assert!(!plain("sub/file"));
        assert!(!plain("c:boot"));
        assert!(!plain("nul\0byte"));
        assert!(!plain(&"x".repeat(RESREF_MAX_LEN_V11 + 1)));
        assert_eq!(ResourceKey::new("../secret", ResourceType::TXT).file_name(), None);
    }

    #[test]
    fn test_from_file_name() {
        let key = ResourceKey::from_file_name("Store01.UTM").unwrap();
        assert_eq!(key.name, "store01");
        assert_eq!(key.res_type, ResourceType::UTM);
        assert!(ResourceKey::from_file_name("readme").is_none());
    }
}
