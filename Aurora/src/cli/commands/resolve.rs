//! CLI command for layered resource resolution

use std::path::{Path, PathBuf};

use crate::formats::common::ResourceKey;
use crate::resolver::{ResolverConfig, ResourceResolver};

pub fn execute(
    resource: &ResourceKey,
    install: Option<&Path>,
    config: Option<&Path>,
    module: Option<&Path>,
    haks: &[PathBuf],
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let mut resolver_config = match (config, install, module) {
        (Some(path), _, _) => ResolverConfig::load_json(path)?,
        (None, Some(install), Some(module)) => ResolverConfig::for_module(install, module)?,
        (None, Some(install), None) => ResolverConfig::from_install_dir(install),
        (None, None, _) => ResolverConfig::new(),
    };
    if let Some(module) = module {
        resolver_config.module_dir = Some(module.to_path_buf());
    }
    // Command-line HAKs outrank the module's own list.
    let mut hak_paths = haks.to_vec();
    hak_paths.append(&mut resolver_config.hak_paths);
    resolver_config.hak_paths = hak_paths;

    let resolver = ResourceResolver::new(resolver_config);
    let Some(found) = resolver.resolve_key(resource) else {
        anyhow::bail!("{resource} not found");
    };

    println!("{resource}: {} bytes from {}", found.data.len(), found.source);
    if let Some(dest) = output {
        std::fs::write(dest, &found.data)?;
        println!("Wrote {}", dest.display());
    }
    Ok(())
}
