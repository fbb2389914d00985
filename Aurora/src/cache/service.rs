//! Versioned, path-validated JSON cache for derived lookups

use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

use super::envelope::{CacheEnvelope, EnvelopeHeader, PathsSnapshot};
use crate::error::Result;

/// Outcome of [`CacheService::load`].
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLoad<T> {
    /// Version and paths match; the items can be used as-is.
    Valid(Vec<T>),
    /// No cache file.
    Missing,
    /// Stale or unreadable; rebuild everything.
    Invalid(String),
}

impl<T> CacheLoad<T> {
    #[must_use]
    pub fn into_valid(self) -> Option<Vec<T>> {
        match self {
            CacheLoad::Valid(items) => Some(items),
            _ => None,
        }
    }
}

/// Default location for a named cache: `<cache dir>/aurora/<name>.json`.
#[must_use]
pub fn default_cache_path(name: &str) -> Option<PathBuf> {
    dirs::cache_dir().map(|p| p.join("aurora").join(format!("{name}.json")))
}

/// Persists a list of records between runs.
///
/// Any version or path mismatch throws the whole cache away; there is no
/// partial reconciliation. Single writer only.
#[derive(Debug, Clone)]
pub struct CacheService<T> {
    path: PathBuf,
    version: u32,
    _items: PhantomData<fn() -> T>,
}

impl<T> CacheService<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, version: u32) -> Self {
        Self {
            path: path.into(),
            version,
            _items: PhantomData,
        }
    }

    /// Cache at [`default_cache_path`], if the platform has a cache dir.
    #[must_use]
    pub fn named(name: &str, version: u32) -> Option<Self> {
        default_cache_path(name).map(|path| Self::new(path, version))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Load and validate the cache against the current paths.
    ///
    /// Never fails: unreadable files come back as [`CacheLoad::Invalid`].
    pub fn load(&self, snapshot: &PathsSnapshot) -> CacheLoad<T> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return CacheLoad::Missing,
            Err(e) => return self.invalid(format!("unreadable: {e}")),
        };

        let header: EnvelopeHeader = match serde_json::from_str(&text) {
            Ok(header) => header,
            Err(e) => return self.invalid(format!("corrupt envelope: {e}")),
        };
        if header.version != self.version {
            return self.invalid(format!(
                "version {} does not match {}",
                header.version, self.version
            ));
        }
        if &header.paths_snapshot != snapshot {
            return self.invalid("configured paths changed".to_string());
        }

        match serde_json::from_str::<CacheEnvelope<T>>(&text) {
            Ok(envelope) => {
                tracing::debug!(
                    "Loaded {} cached items from {} (created {})",
                    envelope.items.len(),
                    self.path.display(),
                    header.created_at
                );
                CacheLoad::Valid(envelope.items)
            }
            Err(e) => self.invalid(format!("corrupt items: {e}")),
        }
    }

    fn invalid(&self, reason: String) -> CacheLoad<T> {
        tracing::warn!("Discarding cache {}: {reason}", self.path.display());
        CacheLoad::Invalid(reason)
    }

    /// Write the cache on a background thread.
    pub fn save(&self, items: Vec<T>, snapshot: PathsSnapshot) -> JoinHandle<Result<()>> {
        let path = self.path.clone();
        let version = self.version;
        std::thread::spawn(move || {
            let envelope = CacheEnvelope::new(version, snapshot, items);
            let result = write_envelope(&path, &envelope);
            if let Err(e) = &result {
                tracing::warn!("Failed to save cache {}: {e}", path.display());
            }
            result
        })
    }

    /// Write the cache on the calling thread.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn save_blocking(&self, items: Vec<T>, snapshot: PathsSnapshot) -> Result<()> {
        write_envelope(&self.path, &CacheEnvelope::new(self.version, snapshot, items))
    }

    /// Return valid cached items, or rebuild and persist them.
    ///
    /// A failed save is logged; the rebuilt items are still returned.
    pub fn load_or_rebuild<F>(&self, snapshot: &PathsSnapshot, rebuild: F) -> Vec<T>
    where
        F: FnOnce() -> Vec<T>,
        T: Clone,
    {
        if let CacheLoad::Valid(items) = self.load(snapshot) {
            return items;
        }
        let items = rebuild();
        if let Err(e) = self.save_blocking(items.clone(), snapshot.clone()) {
            tracing::warn!("Failed to save cache {}: {e}", self.path.display());
        }
        items
    }

    /// Delete the cache file.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be removed.
    pub fn invalidate(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("Invalidated cache {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Serialize to a temp file beside the target, then rename over it.
fn write_envelope<T: Serialize>(path: &Path, envelope: &CacheEnvelope<T>) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    serde_json::to_writer(&mut file, envelope)?;
    file.flush()?;
    file.persist(path)?;

    tracing::info!("Saved {} cached items to {}", envelope.items.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn snapshot(hak: &str) -> PathsSnapshot {
        PathsSnapshot {
            module_dir: None,
            override_dir: Some(PathBuf::from("override")),
            hak_paths: vec![PathBuf::from(hak)],
            base_containers: vec![PathBuf::from("data/nwn_base.key")],
        }
    }

    #[test]
    fn test_missing_then_valid() {
        let temp = TempDir::new().unwrap();
        let cache: CacheService<String> = CacheService::new(temp.path().join("feats.json"), 1);
        assert_eq!(cache.load(&snapshot("a.hak")), CacheLoad::Missing);

        cache.save_blocking(vec!["Alertness".into()], snapshot("a.hak")).unwrap();
        assert_eq!(
            cache.load(&snapshot("a.hak")),
            CacheLoad::Valid(vec!["Alertness".to_string()])
        );
    }

    #[test]
    fn test_corrupt_file_is_invalid() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let cache: CacheService<u32> = CacheService::new(path, 1);
        assert!(matches!(cache.load(&PathsSnapshot::default()), CacheLoad::Invalid(_)));
    }

    #[test]
    fn test_async_save_and_invalidate() {
        let temp = TempDir::new().unwrap();
        let cache: CacheService<u32> = CacheService::new(temp.path().join("nested").join("ids.json"), 2);
        cache.save(vec![1, 2, 3], PathsSnapshot::default()).join().unwrap().unwrap();
        assert_eq!(cache.load(&PathsSnapshot::default()).into_valid(), Some(vec![1, 2, 3]));

        cache.invalidate().unwrap();
        assert_eq!(cache.load(&PathsSnapshot::default()), CacheLoad::Missing);
        cache.invalidate().unwrap();
    }

    #[test]
    fn test_load_or_rebuild_runs_once() {
        let temp = TempDir::new().unwrap();
        let cache: CacheService<u32> = CacheService::new(temp.path().join("c.json"), 1);
        let mut calls = 0;
        let first = cache.load_or_rebuild(&PathsSnapshot::default(), || {
            calls += 1;
            vec![7]
        });
        let second = cache.load_or_rebuild(&PathsSnapshot::default(), || {
            calls += 1;
            vec![8]
        });
        assert_eq!(first, vec![7]);
        assert_eq!(second, vec![7]);
        assert_eq!(calls, 1);
    }
}
