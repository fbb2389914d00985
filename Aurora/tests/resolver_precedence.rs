use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use aurora::prelude::*;
use aurora::resolver::Layer;
use pretty_assertions::assert_eq;
use tempfile::{TempDir, tempdir};

struct Install {
    _dir: TempDir,
    module: PathBuf,
    override_dir: PathBuf,
    hak_a: PathBuf,
    hak_b: PathBuf,
    key: PathBuf,
}

fn write_hak(path: &Path, resources: &[(&str, ResourceType, &[u8])]) {
    let mut writer = ErfWriter::new(ErfType::Hak);
    for (name, res_type, data) in resources {
        writer.add(name, *res_type, data.to_vec()).unwrap();
    }
    writer.write(path).unwrap();
}

/// The same `nw_chicken.utc` in every layer, plus layer-specific extras.
fn install() -> Install {
    let dir = tempdir().unwrap();
    let root = dir.path();

    let module = root.join("modules").join("temp0");
    let override_dir = root.join("override");
    std::fs::create_dir_all(&module).unwrap();
    std::fs::create_dir_all(&override_dir).unwrap();
    std::fs::create_dir_all(root.join("hak")).unwrap();

    std::fs::write(module.join("nw_chicken.utc"), b"module").unwrap();
    std::fs::write(override_dir.join("NW_CHICKEN.UTC"), b"override").unwrap();

    let hak_a = root.join("hak").join("a.hak");
    let hak_b = root.join("hak").join("b.hak");
    write_hak(&hak_a, &[("nw_chicken", ResourceType::UTC, b"hak a")]);
    write_hak(
        &hak_b,
        &[
            ("nw_chicken", ResourceType::UTC, b"hak b"),
            ("only_in_b", ResourceType::UTI, b"b item"),
        ],
    );

    let mut key = KeyBifWriter::new();
    let bif = key.add_bif("data\\base.bif");
    key.add(bif, "nw_chicken", ResourceType::UTC, b"base".to_vec()).unwrap();
    key.add(bif, "feat", ResourceType::TWODA, b"2DA V2.0\n\nLABEL\n0 Alertness\n".to_vec()).unwrap();
    std::fs::create_dir_all(root.join("data")).unwrap();
    let key = key.write(root, "data/nwn_base.key").unwrap();

    Install {
        _dir: dir,
        module,
        override_dir,
        hak_a,
        hak_b,
        key,
    }
}

fn without_haks(mut config: ResolverConfig) -> ResolverConfig {
    config.hak_paths.clear();
    config
}

fn config(i: &Install) -> ResolverConfig {
    ResolverConfig::new()
        .with_module_dir(&i.module)
        .with_override_dir(&i.override_dir)
        .with_hak(&i.hak_a)
        .with_hak(&i.hak_b)
        .with_base_container(&i.key)
}

#[test]
fn test_precedence_module_override_hak_base() {
    let i = install();
    let resolver = ResourceResolver::new(config(&i));
    let chicken = |r: &ResourceResolver| r.resolve("nw_chicken", ResourceType::UTC).unwrap();

    let found = chicken(&resolver);
    assert_eq!(found.data, b"module");
    assert_eq!(found.source.layer(), Layer::Module);

    std::fs::remove_file(i.module.join("nw_chicken.utc")).unwrap();
    resolver.clear_cache();
    let found = chicken(&resolver);
    assert_eq!(found.data, b"override");
    assert_eq!(found.source, ResourceSource::Override(i.override_dir.join("NW_CHICKEN.UTC")));

    std::fs::remove_file(i.override_dir.join("NW_CHICKEN.UTC")).unwrap();
    resolver.clear_cache();
    let found = chicken(&resolver);
    assert_eq!(found.data, b"hak a");
    assert_eq!(found.source, ResourceSource::Hak(i.hak_a.clone()));

    resolver.reload_configuration(without_haks(config(&i)));
    let found = chicken(&resolver);
    assert_eq!(found.data, b"base");
    assert_eq!(found.source, ResourceSource::Base(i.key.clone()));
}

#[test]
fn test_base_key_resources() {
    let i = install();
    let resolver = ResourceResolver::new(config(&i));

    let feat = resolver.resolve("FEAT", ResourceType::TWODA).unwrap();
    assert_eq!(feat.source.layer(), Layer::Base);
    let table = aurora::formats::twoda::parse_2da_bytes(&feat.data).unwrap();
    assert_eq!(table.value(0, "label"), Some("Alertness"));

    let item = resolver.resolve("only_in_b", ResourceType::UTI).unwrap();
    assert_eq!(item.source, ResourceSource::Hak(i.hak_b.clone()));
}

#[test]
fn test_negative_cache_probes_once() {
    let i = install();
    let resolver = ResourceResolver::new(config(&i));

    assert!(resolver.resolve("no_such_thing", ResourceType::UTC).is_none());
    let first = resolver.probe_stats();
    assert_eq!(first.module, 1);
    assert_eq!(first.override_dir, 1);
    assert_eq!(first.hak, 2);
    assert_eq!(first.base, 1);
    assert_eq!(first.negative_hits, 0);

    assert!(resolver.resolve("No_Such_Thing", ResourceType::UTC).is_none());
    let second = resolver.probe_stats();
    assert_eq!(second.total_probes(), first.total_probes());
    assert_eq!(second.negative_hits, 1);
    assert_eq!(resolver.cached_misses(), 1);

    // A different type is a different key.
    assert!(resolver.resolve("no_such_thing", ResourceType::UTI).is_none());
    assert_eq!(resolver.probe_stats().total_probes(), first.total_probes() * 2);
}

#[test]
fn test_invalidation_is_explicit() {
    let i = install();
    let resolver = ResourceResolver::new(config(&i));
    assert!(resolver.resolve("late", ResourceType::UTC).is_none());

    std::fs::write(i.override_dir.join("late.utc"), b"late").unwrap();
    assert!(resolver.resolve("late", ResourceType::UTC).is_none());

    resolver.reload_configuration(config(&i));
    assert_eq!(resolver.cached_misses(), 0);
    assert_eq!(resolver.resolve("late", ResourceType::UTC).unwrap().data, b"late");
}

#[test]
fn test_containers_opened_once() {
    let i = install();
    let resolver = ResourceResolver::new(config(&i));
    assert_eq!(resolver.warm_up(&AtomicBool::new(false)), 3);

    for name in ["a", "b", "c"] {
        let _ = resolver.resolve(name, ResourceType::NCS);
    }
    assert_eq!(resolver.cached_containers(), 3);
}

#[test]
fn test_list_resources_across_layers() {
    let i = install();
    let resolver = ResourceResolver::new(config(&i));

    let all = resolver.list_resources(None);
    let chicken = all
        .iter()
        .find(|(key, _)| key == &ResourceKey::new("nw_chicken", ResourceType::UTC))
        .unwrap();
    assert_eq!(chicken.1.layer(), Layer::Module);
    assert!(all.iter().any(|(key, source)| key.name == "feat" && source.layer() == Layer::Base));
    assert!(all.iter().any(|(key, source)| key.name == "only_in_b" && source.layer() == Layer::Hak));
}

#[test]
fn test_cache_snapshot_tracks_configuration() {
    let i = install();
    let dir = tempdir().unwrap();
    let cache: CacheService<String> = CacheService::new(dir.path().join("utc.json"), 1);
    let resolver = ResourceResolver::new(config(&i));

    let names = |r: &ResourceResolver| {
        r.list_resources(Some(ResourceType::UTC))
            .into_iter()
            .map(|(key, _)| key.name)
            .collect::<Vec<_>>()
    };
    let snapshot = resolver.config().paths_snapshot();
    let built = cache.load_or_rebuild(&snapshot, || names(&resolver));
    assert_eq!(built, vec!["nw_chicken".to_string()]);
    assert_eq!(cache.load(&snapshot), CacheLoad::Valid(built));

    resolver.reload_configuration(without_haks(config(&i)));
    let changed = resolver.config().paths_snapshot();
    assert!(matches!(cache.load(&changed), CacheLoad::Invalid(_)));
}

#[test]
fn test_names_cannot_leave_loose_directories() {
    let i = install();
    let root = i.module.parent().unwrap().parent().unwrap().to_path_buf();
    std::fs::write(root.join("modules").join("secret.txt"), b"outside the module dir").unwrap();
    std::fs::write(root.join("secret.txt"), b"outside the override dir").unwrap();

    let resolver = ResourceResolver::new(config(&i));
    for name in ["../secret", "..\\secret", "../../secret", "sub/secret", "a_name_that_is_far_too_long_for_any_resref"] {
        assert!(resolver.resolve(name, ResourceType::TXT).is_none(), "{name}");
    }
    assert_eq!(resolver.probe_stats().total_probes(), 0);
    assert_eq!(resolver.cached_misses(), 0);
}
