//! Layered resource resolution with container and negative caching

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::RwLock;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::config::ResolverConfig;
use super::source::{ResolvedResource, ResourceSource};
use crate::archive::{ResourceContainer, open_container};
use crate::formats::common::{ResourceKey, ResourceType};
use crate::formats::tlk::TalkTableSet;
use crate::utils::find_case_insensitive;

/// Snapshot of the resolver's probe counters.
///
/// `module` and `override_dir` count directory probes; `hak` and `base`
/// count container lookups, one per container consulted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeStats {
    pub module: u64,
    pub override_dir: u64,
    pub hak: u64,
    pub base: u64,
    /// Lookups answered from the negative cache.
    pub negative_hits: u64,
}

impl ProbeStats {
    /// Probes of every layer combined.
    #[must_use]
    pub fn total_probes(&self) -> u64 {
        self.module + self.override_dir + self.hak + self.base
    }
}

#[derive(Debug, Default)]
struct ProbeCounters {
    module: AtomicU64,
    override_dir: AtomicU64,
    hak: AtomicU64,
    base: AtomicU64,
    negative_hits: AtomicU64,
}

impl ProbeCounters {
    fn snapshot(&self) -> ProbeStats {
        ProbeStats {
            module: self.module.load(Ordering::Relaxed),
            override_dir: self.override_dir.load(Ordering::Relaxed),
            hak: self.hak.load(Ordering::Relaxed),
            base: self.base.load(Ordering::Relaxed),
            negative_hits: self.negative_hits.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        for counter in [&self.module, &self.override_dir, &self.hak, &self.base, &self.negative_hits] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Opened containers keyed by path. `None` marks a container that failed
/// to open and is skipped until the cache is cleared.
type ContainerCache = HashMap<PathBuf, Option<Arc<dyn ResourceContainer>>>;

/// Resolves (name, type) against module dir, override dir, HAKs and base
/// containers, in that order. First hit wins.
///
/// Containers are opened once and kept for the resolver's lifetime; misses
/// are remembered in a negative cache. Both are dropped only by
/// [`ResourceResolver::clear_cache`] or
/// [`ResourceResolver::reload_configuration`].
///
/// # Example
///
/// ```no_run
/// use aurora::formats::ResourceType;
/// use aurora::resolver::{ResolverConfig, ResourceResolver};
///
/// let config = ResolverConfig::from_install_dir("/games/nwn").with_module_dir("/games/nwn/modules/temp0");
/// let resolver = ResourceResolver::new(config);
/// if let Some(found) = resolver.resolve("nw_chicken", ResourceType::UTC) {
///     println!("{} bytes from {}", found.data.len(), found.source);
/// }
/// ```
#[derive(Debug)]
pub struct ResourceResolver {
    config: RwLock<ResolverConfig>,
    containers: RwLock<ContainerCache>,
    negative: RwLock<HashSet<ResourceKey>>,
    pub(super) talk_tables: RwLock<Option<Arc<TalkTableSet>>>,
    /// Bumped on every invalidation so a lookup that straddles one does not
    /// record a stale miss.
    generation: AtomicU64,
    counters: ProbeCounters,
}

impl ResourceResolver {
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        tracing::debug!(
            "Resolver: {} HAKs, {} base containers",
            config.hak_paths.len(),
            config.base_containers.len()
        );
        Self {
            config: RwLock::new(config),
            containers: RwLock::new(HashMap::new()),
            negative: RwLock::new(HashSet::new()),
            talk_tables: RwLock::new(None),
            generation: AtomicU64::new(0),
            counters: ProbeCounters::default(),
        }
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> ResolverConfig {
        self.config.read().clone()
    }

    #[must_use]
    pub fn resolve(&self, name: &str, res_type: ResourceType) -> Option<ResolvedResource> {
        self.resolve_key(&ResourceKey::new(name, res_type))
    }

    /// Resolve a key. `None` is a normal miss and is cached.
    ///
    /// Names that are not [plain](ResourceKey::is_plain_name) miss without
    /// probing. Unreadable files and malformed containers are logged and skipped.
    #[must_use]
    pub fn resolve_key(&self, key: &ResourceKey) -> Option<ResolvedResource> {
        if !key.is_plain_name() {
            tracing::debug!("Not a resource name: {key}");
            return None;
        }
        if self.negative.read().contains(key) {
            self.counters.negative_hits.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let generation = self.generation.load(Ordering::Acquire);
        let found = {
            let config = self.config.read();
            self.probe(&config, key)
        };

        if found.is_none() {
            let mut negative = self.negative.write();
            if self.generation.load(Ordering::Acquire) == generation {
                negative.insert(key.clone());
            }
        }
        found
    }

    fn probe(&self, config: &ResolverConfig, key: &ResourceKey) -> Option<ResolvedResource> {
        if let Some(dir) = &config.module_dir {
            self.counters.module.fetch_add(1, Ordering::Relaxed);
            if let Some((path, data)) = read_loose(dir, key) {
                return Some(ResolvedResource {
                    data,
                    source: ResourceSource::Module(path),
                });
            }
        }

        if let Some(dir) = &config.override_dir {
            self.counters.override_dir.fetch_add(1, Ordering::Relaxed);
            if let Some((path, data)) = read_loose(dir, key) {
                return Some(ResolvedResource {
                    data,
                    source: ResourceSource::Override(path),
                });
            }
        }

        for path in &config.hak_paths {
            self.counters.hak.fetch_add(1, Ordering::Relaxed);
            if let Some(data) = self.read_from(path, key) {
                return Some(ResolvedResource {
                    data,
                    source: ResourceSource::Hak(path.clone()),
                });
            }
        }

        for path in &config.base_containers {
            self.counters.base.fetch_add(1, Ordering::Relaxed);
            if let Some(data) = self.read_from(path, key) {
                return Some(ResolvedResource {
                    data,
                    source: ResourceSource::Base(path.clone()),
                });
            }
        }

        None
    }

    fn read_from(&self, path: &Path, key: &ResourceKey) -> Option<Vec<u8>> {
        let container = self.container(path)?;
        match container.read(key) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Failed to read {key} from {}: {e}", path.display());
                None
            }
        }
    }

    /// Open (or fetch the cached handle of) a container.
    fn container(&self, path: &Path) -> Option<Arc<dyn ResourceContainer>> {
        if let Some(cached) = self.containers.read().get(path) {
            return cached.clone();
        }

        let opened = match open_container(path) {
            Ok(container) => {
                tracing::debug!("Opened {} ({})", path.display(), container.kind());
                Some(container)
            }
            Err(e) => {
                tracing::warn!("Skipping container {}: {e}", path.display());
                None
            }
        };

        self.containers
            .write()
            .entry(path.to_path_buf())
            .or_insert(opened)
            .clone()
    }

    /// Drop every opened container, the negative cache and loaded talk
    /// tables.
    pub fn clear_cache(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        let containers = {
            let mut cache = self.containers.write();
            let n = cache.len();
            cache.clear();
            n
        };
        let misses = {
            let mut negative = self.negative.write();
            let n = negative.len();
            negative.clear();
            n
        };
        *self.talk_tables.write() = None;
        tracing::info!("Cleared resolver cache ({containers} containers, {misses} cached misses)");
    }

    /// Replace the configuration and invalidate everything derived from the
    /// old one.
    pub fn reload_configuration(&self, config: ResolverConfig) {
        *self.config.write() = config;
        self.clear_cache();
    }

    /// Open and index every configured container in parallel.
    ///
    /// `cancel` is checked before each container; containers already
    /// opened stay cached. Returns the number of containers that opened.
    pub fn warm_up(&self, cancel: &AtomicBool) -> usize {
        let paths: Vec<PathBuf> = {
            let config = self.config.read();
            config.hak_paths.iter().chain(&config.base_containers).cloned().collect()
        };

        let opened = paths
            .par_iter()
            .filter(|path| !cancel.load(Ordering::Relaxed) && self.container(path).is_some())
            .count();

        if cancel.load(Ordering::Relaxed) {
            tracing::info!("Warm-up cancelled after {opened} of {} containers", paths.len());
        } else {
            tracing::info!("Warmed up {opened} of {} containers", paths.len());
        }
        opened
    }

    /// Every resource visible through the resolver, with the source that
    /// wins for it. Optionally restricted to one type.
    #[must_use]
    pub fn list_resources(&self, res_type: Option<ResourceType>) -> Vec<(ResourceKey, ResourceSource)> {
        let config = self.config.read();
        let wanted = |key: &ResourceKey| res_type.is_none_or(|t| key.res_type == t);
        let mut winners: BTreeMap<ResourceKey, ResourceSource> = BTreeMap::new();

        let loose: [(Option<&PathBuf>, fn(PathBuf) -> ResourceSource); 2] = [
            (config.module_dir.as_ref(), ResourceSource::Module),
            (config.override_dir.as_ref(), ResourceSource::Override),
        ];
        for (dir, tag) in loose {
            let Some(dir) = dir else { continue };
            for (key, path) in scan_loose(dir) {
                if wanted(&key) {
                    winners.entry(key).or_insert_with(|| tag(path));
                }
            }
        }

        let archived: [(&[PathBuf], fn(PathBuf) -> ResourceSource); 2] = [
            (&config.hak_paths, ResourceSource::Hak),
            (&config.base_containers, ResourceSource::Base),
        ];
        for (paths, tag) in archived {
            for path in paths {
                let Some(container) = self.container(path) else { continue };
                for key in container.keys() {
                    if wanted(&key) {
                        winners.entry(key).or_insert_with(|| tag(path.clone()));
                    }
                }
            }
        }

        winners.into_iter().collect()
    }

    #[must_use]
    pub fn probe_stats(&self) -> ProbeStats {
        self.counters.snapshot()
    }

    pub fn reset_probe_stats(&self) {
        self.counters.reset();
    }

    /// Number of keys in the negative cache.
    #[must_use]
    pub fn cached_misses(&self) -> usize {
        self.negative.read().len()
    }

    /// Number of container paths tried so far, including failures.
    #[must_use]
    pub fn cached_containers(&self) -> usize {
        self.containers.read().len()
    }
}

impl Drop for ResourceResolver {
    fn drop(&mut self) {
        let containers = self.containers.get_mut();
        if !containers.is_empty() {
            tracing::debug!("Releasing {} container handles", containers.len());
        }
    }
}

/// Read `name.ext` from a loose directory, matching case-insensitively.
fn read_loose(dir: &Path, key: &ResourceKey) -> Option<(PathBuf, Vec<u8>)> {
    let file_name = key.file_name()?;
    let path = find_case_insensitive(dir, &file_name)?;
    match std::fs::read(&path) {
        Ok(data) => Some((path, data)),
        Err(e) => {
            tracing::warn!("Failed to read {}: {e}", path.display());
            None
        }
    }
}

/// Resource files directly inside `dir`.
fn scan_loose(dir: &Path) -> Vec<(ResourceKey, PathBuf)> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        tracing::debug!("Cannot list {}", dir.display());
        return Vec::new();
    };
    entries
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
        .filter_map(|e| {
            let key = ResourceKey::from_file_name(&e.file_name().to_string_lossy())?;
            Some((key, e.path()))
        })
        .collect()
}
