//! Where a resolved resource came from

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Resolution layers in probe order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Layer {
    Module,
    Override,
    Hak,
    Base,
}

impl Layer {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Layer::Module => "module",
            Layer::Override => "override",
            Layer::Hak => "hak",
            Layer::Base => "base",
        }
    }
}

/// Source tag of a resolved resource.
///
/// Loose-file layers carry the file that was read; container layers carry
/// the container path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "layer", content = "path", rename_all = "camelCase")]
pub enum ResourceSource {
    Module(PathBuf),
    Override(PathBuf),
    Hak(PathBuf),
    Base(PathBuf),
}

impl ResourceSource {
    #[must_use]
    pub fn layer(&self) -> Layer {
        match self {
            ResourceSource::Module(_) => Layer::Module,
            ResourceSource::Override(_) => Layer::Override,
            ResourceSource::Hak(_) => Layer::Hak,
            ResourceSource::Base(_) => Layer::Base,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ResourceSource::Module(p)
            | ResourceSource::Override(p)
            | ResourceSource::Hak(p)
            | ResourceSource::Base(p) => p,
        }
    }
}

impl fmt::Display for ResourceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.layer().as_str(), self.path().display())
    }
}

/// Bytes of a resolved resource and the layer that supplied them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResource {
    pub data: Vec<u8>,
    pub source: ResourceSource,
}
