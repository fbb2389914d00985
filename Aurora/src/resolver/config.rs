//! Resolver configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cache::PathsSnapshot;
use crate::error::Result;
use crate::utils::{find_case_insensitive, resolve_relative_path};

/// KEY files of a classic install, highest priority first.
const CLASSIC_KEYS: [&str; 5] = ["xp3.key", "xp2patch.key", "xp2.key", "xp1.key", "chitin.key"];

/// Paths the resolver probes.
///
/// HAKs and base containers are probed in the order they appear here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverConfig {
    /// Directory of the module or document being edited.
    pub module_dir: Option<PathBuf>,
    pub override_dir: Option<PathBuf>,
    pub hak_paths: Vec<PathBuf>,
    /// KEY files or ERFs holding the base game data.
    pub base_containers: Vec<PathBuf>,
    /// Primary talk table, normally `dialog.tlk`.
    pub talk_table: Option<PathBuf>,
    /// Module talk table addressed by StrRefs at or above `0x01000000`.
    pub custom_talk_table: Option<PathBuf>,
}

impl ResolverConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for a game install using the conventional layout.
    ///
    /// Enhanced Edition installs use `data/nwn_base.key` and
    /// `lang/en/data/dialog.tlk`; classic installs use `chitin.key` and the
    /// expansion KEYs. Missing pieces are left unset.
    #[must_use]
    pub fn from_install_dir<P: AsRef<Path>>(install: P) -> Self {
        let install = install.as_ref();

        let base_containers = match resolve_relative_path(install, "data/nwn_base.key") {
            Some(key) => vec![key],
            None => CLASSIC_KEYS
                .iter()
                .filter_map(|name| find_case_insensitive(install, name))
                .collect(),
        };

        let config = Self {
            override_dir: resolve_dir(install, "override"),
            base_containers,
            talk_table: find_case_insensitive(install, "dialog.tlk")
                .or_else(|| resolve_relative_path(install, "lang/en/data/dialog.tlk")),
            ..Self::default()
        };

        tracing::debug!(
            "Install {}: {} base containers, override {}",
            install.display(),
            config.base_containers.len(),
            config.override_dir.is_some()
        );
        config
    }

    #[must_use]
    pub fn with_module_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.module_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_override_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.override_dir = Some(dir.into());
        self
    }

    /// Append a HAK at the lowest HAK priority.
    #[must_use]
    pub fn with_hak(mut self, path: impl Into<PathBuf>) -> Self {
        self.hak_paths.push(path.into());
        self
    }

    /// Append HAKs by name (no extension), looked up in `hak_dir`.
    ///
    /// Names not found on disk are still registered so the miss is logged
    /// when the resolver first opens them.
    #[must_use]
    pub fn with_hak_names<S: AsRef<str>>(mut self, hak_dir: &Path, names: &[S]) -> Self {
        for name in names {
            let file = format!("{}.hak", name.as_ref());
            let path = find_case_insensitive(hak_dir, &file).unwrap_or_else(|| hak_dir.join(&file));
            self.hak_paths.push(path);
        }
        self
    }

    /// Append a base container at the lowest base priority.
    #[must_use]
    pub fn with_base_container(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_containers.push(path.into());
        self
    }

    #[must_use]
    pub fn with_talk_table(mut self, path: impl Into<PathBuf>) -> Self {
        self.talk_table = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_custom_talk_table(mut self, path: impl Into<PathBuf>) -> Self {
        self.custom_talk_table = Some(path.into());
        self
    }

    /// The paths a derived-data cache must be validated against.
    #[must_use]
    pub fn paths_snapshot(&self) -> PathsSnapshot {
        PathsSnapshot {
            module_dir: self.module_dir.clone(),
            override_dir: self.override_dir.clone(),
            hak_paths: self.hak_paths.clone(),
            base_containers: self.base_containers.clone(),
        }
    }

    /// Read a configuration saved with [`ResolverConfig::save_json`].
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Subdirectory of `base` matched case-insensitively.
pub(super) fn resolve_dir(base: &Path, name: &str) -> Option<PathBuf> {
    let exact = base.join(name);
    if exact.is_dir() {
        return Some(exact);
    }
    std::fs::read_dir(base)
        .ok()?
        .filter_map(std::result::Result::ok)
        .find(|e| {
            e.file_name().to_string_lossy().eq_ignore_ascii_case(name)
                && e.file_type().is_ok_and(|t| t.is_dir())
        })
        .map(|e| e.path())
}
