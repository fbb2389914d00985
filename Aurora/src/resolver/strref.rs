//! StrRef lookups against the configured talk tables

use std::sync::Arc;

use super::config::ResolverConfig;
use super::layered::ResourceResolver;
use crate::error::Result;
use crate::formats::tlk::{TalkTableSet, TlkEntry, read_tlk};

/// Load the primary and custom talk tables named by `config`.
///
/// # Errors
/// Returns an error if a configured table cannot be read or parsed.
pub fn load_talk_tables(config: &ResolverConfig) -> Result<TalkTableSet> {
    let primary = config.talk_table.as_ref().map(read_tlk).transpose()?;
    let custom = config.custom_talk_table.as_ref().map(read_tlk).transpose()?;
    tracing::info!(
        "Loaded talk tables: primary {} entries, custom {} entries",
        primary.as_ref().map_or(0, |t| t.len()),
        custom.as_ref().map_or(0, |t| t.len())
    );
    Ok(TalkTableSet { primary, custom })
}

impl ResourceResolver {
    /// Talk tables for the current configuration, loaded on first use and
    /// kept until the cache is cleared.
    ///
    /// # Errors
    /// Returns an error if a configured table cannot be read or parsed.
    pub fn talk_tables(&self) -> Result<Arc<TalkTableSet>> {
        if let Some(tables) = self.talk_tables.read().as_ref() {
            return Ok(Arc::clone(tables));
        }
        let loaded = Arc::new(load_talk_tables(&self.config())?);
        let mut slot = self.talk_tables.write();
        Ok(Arc::clone(slot.get_or_insert(loaded)))
    }

    /// Entry for a StrRef. StrRefs at or above `0x01000000` address the
    /// custom table only.
    ///
    /// A table that fails to load is logged and treated as empty.
    #[must_use]
    pub fn resolve_strref(&self, str_ref: u32) -> Option<TlkEntry> {
        match self.talk_tables() {
            Ok(tables) => tables.get(str_ref).cloned(),
            Err(e) => {
                tracing::warn!("Talk tables unavailable: {e}");
                None
            }
        }
    }

    #[must_use]
    pub fn strref_text(&self, str_ref: u32) -> Option<String> {
        self.resolve_strref(str_ref)?.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::tlk::{TalkTable, write_tlk};
    use tempfile::TempDir;

    fn write_table(path: &std::path::Path, prefix: &str, n: usize) {
        let mut table = TalkTable::default();
        for i in 0..n {
            table.push(TlkEntry::with_text(format!("{prefix} {i}")));
        }
        write_tlk(&table, path).unwrap();
    }

    #[test]
    fn test_strref_routing_through_resolver() {
        let temp = TempDir::new().unwrap();
        let dialog = temp.path().join("dialog.tlk");
        let custom = temp.path().join("custom.tlk");
        write_table(&dialog, "base", 10);
        write_table(&custom, "module", 3);

        let resolver = ResourceResolver::new(
            ResolverConfig::new().with_talk_table(&dialog).with_custom_talk_table(&custom),
        );
        assert_eq!(resolver.strref_text(5).as_deref(), Some("base 5"));
        assert_eq!(resolver.strref_text(0x0100_0001).as_deref(), Some("module 1"));
        assert_eq!(resolver.strref_text(0x0100_0005), None);
        assert_eq!(resolver.strref_text(0xFFFF_FFFF), None);
    }

    #[test]
    fn test_missing_table_is_not_fatal() {
        let temp = TempDir::new().unwrap();
        let resolver = ResourceResolver::new(ResolverConfig::new().with_talk_table(temp.path().join("none.tlk")));
        assert!(resolver.talk_tables().is_err());
        assert_eq!(resolver.strref_text(0), None);
    }

    #[test]
    fn test_no_tables_configured() {
        let set = load_talk_tables(&ResolverConfig::new()).unwrap();
        assert!(set.primary.is_none());
        assert!(set.custom.is_none());
    }
}
