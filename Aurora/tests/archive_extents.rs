use aurora::archive::{BifFile, ErfVersion};
use aurora::prelude::*;
use aurora::resolver::Layer;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn hak_bytes() -> Vec<u8> {
    let mut writer = ErfWriter::new(ErfType::Hak);
    writer.add("broken", ResourceType::UTC, vec![1; 32]).unwrap();
    writer.add("fine", ResourceType::UTC, vec![2; 8]).unwrap();
    writer.to_bytes().unwrap()
}

/// Point the first resource at `offset` with `size`.
fn patch_first_extent(data: &mut [u8], offset: u32, size: u32) {
    let list = u32::from_le_bytes(data[28..32].try_into().unwrap()) as usize;
    data[list..list + 4].copy_from_slice(&offset.to_le_bytes());
    data[list + 4..list + 8].copy_from_slice(&size.to_le_bytes());
}

#[test]
fn test_overflowing_extent_is_rejected_in_memory_and_on_disk() {
    let mut data = hak_bytes();
    patch_first_extent(&mut data, 0xFFFF_FFFE, 0x10);

    let in_memory = ErfArchive::from_bytes(data.clone()).unwrap();
    let err = in_memory.read_resource("broken", ResourceType::UTC).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OverflowDetected);

    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.hak");
    std::fs::write(&path, &data).unwrap();
    let on_disk = ErfArchive::open(&path).unwrap();
    let err = on_disk.read_resource("broken", ResourceType::UTC).unwrap_err();
    assert!(matches!(err, Error::OverflowDetected { offset: 0xFFFF_FFFE, size: 0x10 }));

    // Other entries stay readable.
    assert_eq!(on_disk.read_resource("fine", ResourceType::UTC).unwrap(), Some(vec![2; 8]));
}

#[test]
fn test_extent_past_end_is_bounds_violation() {
    let mut data = hak_bytes();
    let len = data.len() as u32;
    patch_first_extent(&mut data, len - 4, 8);

    let archive = ErfArchive::from_bytes(data).unwrap();
    let err = archive.read_resource("broken", ResourceType::UTC).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BoundsViolation);
}

#[test]
fn test_resolver_skips_bad_entry() {
    let dir = tempdir().unwrap();
    let mut data = hak_bytes();
    patch_first_extent(&mut data, 0xFFFF_FFFE, 0x10);
    let bad = dir.path().join("bad.hak");
    std::fs::write(&bad, &data).unwrap();

    let mut fallback = ErfWriter::new(ErfType::Hak);
    fallback.add("broken", ResourceType::UTC, b"good copy".to_vec()).unwrap();
    let good = dir.path().join("good.hak");
    fallback.write(&good).unwrap();

    let resolver = ResourceResolver::new(ResolverConfig::new().with_hak(&bad).with_hak(&good));
    let found = resolver.resolve("broken", ResourceType::UTC).unwrap();
    assert_eq!(found.data, b"good copy");
    assert_eq!(found.source.layer(), Layer::Hak);
}

#[test]
fn test_open_container_dispatch() {
    let dir = tempdir().unwrap();

    let erf = dir.path().join("module.mod");
    let mut writer = ErfWriter::new(ErfType::Mod).with_version(ErfVersion::V1_1);
    writer.add("a_rather_long_resource_name_v11", ResourceType::NSS, b"void main() {}".to_vec()).unwrap();
    writer.write(&erf).unwrap();

    let mut key = KeyBifWriter::new();
    let bif = key.add_bif("data\\scripts.bif");
    key.add(bif, "nw_s0_sleep", ResourceType::NCS, vec![0x4e, 0x43, 0x53]).unwrap();
    let key_path = key.write(dir.path(), "chitin.key").unwrap();

    let opened = open_container(&erf).unwrap();
    assert_eq!(opened.kind().to_string(), "MOD");
    assert_eq!(
        opened.read(&ResourceKey::new("A_Rather_Long_Resource_Name_V11", ResourceType::NSS)).unwrap(),
        Some(b"void main() {}".to_vec())
    );

    let opened = open_container(&key_path).unwrap();
    assert_eq!(opened.kind().to_string(), "KEY");
    assert!(opened.contains(&ResourceKey::new("nw_s0_sleep", ResourceType::NCS)));
    assert_eq!(opened.keys().len(), 1);

    let junk = dir.path().join("junk.bin");
    std::fs::write(&junk, b"not an archive at all").unwrap();
    assert!(matches!(open_container(&junk), Err(Error::UnknownContainer { .. })));
}

#[test]
fn test_missing_bif_reported() {
    let dir = tempdir().unwrap();
    let mut key = KeyBifWriter::new();
    let bif = key.add_bif("data\\gone.bif");
    key.add(bif, "x", ResourceType::NCS, vec![1]).unwrap();
    let key_path = key.write(dir.path(), "chitin.key").unwrap();
    std::fs::remove_file(dir.path().join("data").join("gone.bif")).unwrap();

    let container = KeyBifContainer::open(&key_path).unwrap();
    let err = container.read(&ResourceKey::new("x", ResourceType::NCS)).unwrap_err();
    assert!(matches!(err, Error::BifMissing { .. }));
}

#[test]
fn test_bif_table_bounds() {
    let (_, bifs) = {
        let mut key = KeyBifWriter::new();
        let bif = key.add_bif("data\\one.bif");
        key.add(bif, "only", ResourceType::NCS, vec![9]).unwrap();
        key.build().unwrap()
    };
    let bif = BifFile::from_bytes(bifs[0].1.clone()).unwrap();
    assert_eq!(bif.read_index(0).unwrap(), vec![9]);
    assert_eq!(bif.read_index(1).unwrap_err().kind(), ErrorKind::BoundsViolation);
}
