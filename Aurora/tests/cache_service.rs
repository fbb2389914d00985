use std::path::PathBuf;

use aurora::prelude::*;
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use tempfile::tempdir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct PaletteItem {
    resref: String,
    name: String,
}

fn items() -> Vec<PaletteItem> {
    vec![
        PaletteItem {
            resref: "nw_chicken".into(),
            name: "Chicken".into(),
        },
        PaletteItem {
            resref: "nw_cow".into(),
            name: "Cow".into(),
        },
    ]
}

fn snapshot() -> PathsSnapshot {
    ResolverConfig::new()
        .with_module_dir("/games/nwn/modules/temp0")
        .with_hak("/games/nwn/hak/cep2_top.hak")
        .with_base_container("/games/nwn/data/nwn_base.key")
        .paths_snapshot()
}

#[test]
fn test_envelope_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("creature_palette.json");
    let cache = CacheService::new(&path, 4);
    cache.save(items(), snapshot()).join().unwrap().unwrap();

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["version"], 4);
    assert!(json["createdAt"].as_str().is_some());
    assert_eq!(json["pathsSnapshot"]["hakPaths"][0], "/games/nwn/hak/cep2_top.hak");
    assert_eq!(json["pathsSnapshot"]["overrideDir"], serde_json::Value::Null);
    assert_eq!(json["items"][1]["resref"], "nw_cow");

    assert_eq!(cache.load(&snapshot()), CacheLoad::Valid(items()));
}

#[test]
fn test_version_mismatch_invalidates() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("palette.json");
    CacheService::<PaletteItem>::new(&path, 1).save_blocking(items(), snapshot()).unwrap();

    // A newer build with a different record shape must not try to parse items.
    let newer: CacheService<u64> = CacheService::new(&path, 2);
    assert!(matches!(newer.load(&snapshot()), CacheLoad::Invalid(reason) if reason.contains("version")));
}

#[test]
fn test_path_change_invalidates_whole_cache() {
    let dir = tempdir().unwrap();
    let cache: CacheService<PaletteItem> = CacheService::new(dir.path().join("palette.json"), 1);
    cache.save_blocking(items(), snapshot()).unwrap();

    let mut moved = snapshot();
    moved.hak_paths.push(PathBuf::from("/games/nwn/hak/extra.hak"));
    assert!(matches!(cache.load(&moved), CacheLoad::Invalid(_)));

    let mut rebuilt = false;
    let result = cache.load_or_rebuild(&moved, || {
        rebuilt = true;
        items()[..1].to_vec()
    });
    assert!(rebuilt);
    assert_eq!(result.len(), 1);
    assert_eq!(cache.load(&moved), CacheLoad::Valid(result));
    assert!(matches!(cache.load(&snapshot()), CacheLoad::Invalid(_)));
}

#[test]
fn test_overwrite_replaces_previous_file() {
    let dir = tempdir().unwrap();
    let cache: CacheService<PaletteItem> = CacheService::new(dir.path().join("palette.json"), 1);
    cache.save_blocking(items(), snapshot()).unwrap();
    cache.save_blocking(Vec::new(), snapshot()).unwrap();

    assert_eq!(cache.load(&snapshot()), CacheLoad::Valid(Vec::new()));
    let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(leftovers, 1);
}

#[test]
fn test_default_location() {
    if let Some(path) = aurora::cache::default_cache_path("feats") {
        assert!(path.ends_with("aurora/feats.json"));
    }
}
