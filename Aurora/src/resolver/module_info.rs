//! Resolver setup from a module's `module.ifo`

use std::path::Path;

use super::config::{ResolverConfig, resolve_dir};
use crate::error::{Error, Result};
use crate::formats::gff::{GffDocument, read_gff};
use crate::utils::find_case_insensitive;

/// HAK names a module lists, highest priority first.
///
/// Reads `Mod_HakList`; modules saved before HAK lists existed carry a
/// single `Mod_Hak` string instead.
#[must_use]
pub fn hak_names_from_ifo(ifo: &GffDocument) -> Vec<String> {
    let listed: Vec<String> = ifo
        .root
        .get_list("Mod_HakList")
        .unwrap_or_default()
        .iter()
        .filter_map(|entry| entry.get_string("Mod_Hak"))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    if !listed.is_empty() {
        return listed;
    }

    ifo.root
        .get_string("Mod_Hak")
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| vec![name.to_string()])
        .unwrap_or_default()
}

/// Name of the module's custom talk table, without extension.
#[must_use]
pub fn custom_tlk_from_ifo(ifo: &GffDocument) -> Option<String> {
    let name = ifo.root.get_string("Mod_CustomTlk")?.trim();
    let name = name
        .len()
        .checked_sub(4)
        .filter(|&stem| name.is_char_boundary(stem) && name[stem..].eq_ignore_ascii_case(".tlk"))
        .map_or(name, |stem| &name[..stem]);
    (!name.is_empty()).then(|| name.to_string())
}

impl ResolverConfig {
    /// Add the HAKs and custom talk table a module declares, looked up in
    /// the install's `hak/` and `tlk/` directories.
    #[must_use]
    pub fn with_module_info(self, install: &Path, ifo: &GffDocument) -> Self {
        let haks = hak_names_from_ifo(ifo);
        let hak_dir = resolve_dir(install, "hak").unwrap_or_else(|| install.join("hak"));
        let mut config = self.with_hak_names(&hak_dir, &haks);

        if let Some(name) = custom_tlk_from_ifo(ifo) {
            let tlk_dir = resolve_dir(install, "tlk").unwrap_or_else(|| install.join("tlk"));
            let file = format!("{name}.tlk");
            let path = find_case_insensitive(&tlk_dir, &file).unwrap_or_else(|| tlk_dir.join(&file));
            config.custom_talk_table = Some(path);
        }
        config
    }

    /// Configuration for editing an unpacked module directory: the install
    /// layout plus the module's own HAKs and custom talk table.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPath`] if the directory has no `module.ifo`,
    /// or the GFF error if it cannot be decoded.
    pub fn for_module(install: &Path, module_dir: &Path) -> Result<Self> {
        let ifo_path = find_case_insensitive(module_dir, "module.ifo")
            .ok_or_else(|| Error::InvalidPath(format!("no module.ifo in {}", module_dir.display())))?;
        let ifo = read_gff(&ifo_path)?;
        tracing::info!("Module {}: {} HAKs", module_dir.display(), hak_names_from_ifo(&ifo).len());

        Ok(Self::from_install_dir(install)
            .with_module_dir(module_dir)
            .with_module_info(install, &ifo))
    }
}
