//! Generic on-disk cache for lookups derived from game resources
//!
//! Consumers (palette builders, feat and spell indexes) use [`CacheService`]
//! to avoid re-scanning every container on each run. A cache records the
//! resolver paths it was built from and is discarded whole when they change.
//!
//! ```no_run
//! use aurora::cache::{CacheLoad, CacheService};
//! use aurora::resolver::ResolverConfig;
//!
//! let config = ResolverConfig::from_install_dir("/games/nwn");
//! let cache: CacheService<String> = CacheService::new("feats.json", 1);
//! let feats = cache.load_or_rebuild(&config.paths_snapshot(), || vec!["Alertness".to_string()]);
//! # let _ = feats;
//! ```

mod envelope;
mod service;

pub use envelope::{CacheEnvelope, PathsSnapshot};
pub use service::{CacheLoad, CacheService, default_cache_path};
