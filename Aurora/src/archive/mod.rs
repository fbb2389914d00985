//! Resource containers: ERF/HAK/MOD archives and KEY/BIF sets
//!
//! Every container exposes the same [`ResourceContainer`] interface so the
//! resolver can treat HAKs and base-game data alike.

pub mod erf;
pub mod key_bif;
mod storage;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::formats::common::{ResRef, ResourceKey, ResourceType};

pub use erf::{ErfArchive, ErfType, ErfVersion, ErfWriter};
pub use key_bif::{BifFile, KeyBifContainer, KeyBifWriter};
pub use storage::{ContainerStorage, MAX_CONTAINER_OFFSET};

/// Directory entry for one resource inside a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    /// Name as stored, original case preserved.
    pub resref: ResRef,
    pub res_type: ResourceType,
    pub offset: u32,
    pub size: u32,
}

impl ResourceEntry {
    #[must_use]
    pub fn key(&self) -> ResourceKey {
        self.resref.key(self.res_type)
    }
}

/// What sort of container a [`ResourceContainer`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    Erf(ErfType),
    KeyBif,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::Erf(t) => write!(f, "{}", t.as_str()),
            ContainerKind::KeyBif => f.write_str("KEY"),
        }
    }
}

/// A read-only set of resources addressed by (name, type).
pub trait ResourceContainer: Send + Sync + fmt::Debug {
    /// File the container was opened from, if any.
    fn path(&self) -> Option<&Path>;

    fn kind(&self) -> ContainerKind;

    /// Every key in the container, in directory order.
    fn keys(&self) -> Vec<ResourceKey>;

    fn contains(&self, key: &ResourceKey) -> bool;

    /// Extract one resource. `Ok(None)` means the key is not present.
    ///
    /// # Errors
    /// Returns an error if the entry's extent is invalid or the read fails.
    fn read(&self, key: &ResourceKey) -> Result<Option<Vec<u8>>>;

    /// Short display name, normally the file name.
    fn name(&self) -> String {
        self.path()
            .and_then(Path::file_name)
            .map_or_else(|| self.kind().to_string(), |n| n.to_string_lossy().into_owned())
    }
}

/// Open any supported container, deciding the format from its magic.
///
/// ERF-family archives are opened in metadata-only mode.
///
/// # Errors
/// Returns [`Error::UnknownContainer`] for unrecognised files, or any error
/// from the specific reader.
pub fn open_container<P: AsRef<Path>>(path: P) -> Result<Arc<dyn ResourceContainer>> {
    let path = path.as_ref();
    let storage = ContainerStorage::open(path)?;
    let magic = storage.read_prefix(8)?;

    if magic.starts_with(b"KEY ") {
        drop(storage);
        return Ok(Arc::new(KeyBifContainer::open(path)?));
    }
    if magic.len() >= 4 && ErfType::from_magic(&magic[..4]).is_some() {
        return Ok(Arc::new(ErfArchive::from_storage(storage, Some(path.to_path_buf()))?));
    }

    Err(Error::UnknownContainer {
        path: path.to_path_buf(),
    })
}
