//! On-disk cache envelope

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The resolver paths a cache was built against.
///
/// A cache is only valid while the current configuration produces an equal
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathsSnapshot {
    pub module_dir: Option<PathBuf>,
    pub override_dir: Option<PathBuf>,
    pub hak_paths: Vec<PathBuf>,
    pub base_containers: Vec<PathBuf>,
}

/// `{ version, createdAt, pathsSnapshot, items }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEnvelope<T> {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub paths_snapshot: PathsSnapshot,
    pub items: Vec<T>,
}

impl<T> CacheEnvelope<T> {
    #[must_use]
    pub fn new(version: u32, paths_snapshot: PathsSnapshot, items: Vec<T>) -> Self {
        Self {
            version,
            created_at: Utc::now(),
            paths_snapshot,
            items,
        }
    }
}

/// Envelope without its payload, read first so a schema change in `T`
/// surfaces as a version mismatch rather than a parse failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EnvelopeHeader {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub paths_snapshot: PathsSnapshot,
}
