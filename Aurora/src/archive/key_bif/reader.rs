//! KEY and BIF readers

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt};
use parking_lot::RwLock;

use super::{
    BIF_ENTRY_SIZE, BIF_HEADER_SIZE, KEY_ENTRY_SIZE, KEY_FILE_ENTRY_SIZE, KEY_HEADER_SIZE,
    split_res_id,
};
use crate::archive::{ContainerKind, ContainerStorage, ResourceContainer, ResourceEntry};
use crate::error::{Error, Result};
use crate::formats::common::{ResRef, ResourceKey, ResourceType, decode_cp1252};
use crate::utils::{normalize_path, resolve_relative_path};

/// One KEY entry: where a resource lives.
#[derive(Debug, Clone, PartialEq, Eq)]
struct KeyEntry {
    resref: ResRef,
    res_type: ResourceType,
    res_id: u32,
}

/// A BIF listed in the KEY file table.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BifReference {
    /// Path as written in the KEY, e.g. `data\2da.bif`.
    name: String,
    size: u32,
}

/// A base-game KEY and the BIFs it references.
///
/// BIFs are opened on first use and kept open for the container's lifetime.
#[derive(Debug)]
pub struct KeyBifContainer {
    path: PathBuf,
    /// Directory BIF paths are relative to.
    root: PathBuf,
    bifs: Vec<BifReference>,
    keys: Vec<KeyEntry>,
    index: HashMap<ResourceKey, usize>,
    open_bifs: RwLock<HashMap<u32, Arc<BifFile>>>,
}

impl KeyBifContainer {
    /// Parse a KEY file. BIF paths resolve against the KEY's parent
    /// directory, or the one above it when the KEY sits in `data/`.
    ///
    /// # Errors
    /// Returns an error if the KEY cannot be read or is malformed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let parent = path.parent().unwrap_or(Path::new("."));
        let root = if parent
            .file_name()
            .is_some_and(|n| n.to_string_lossy().eq_ignore_ascii_case("data"))
        {
            parent.parent().unwrap_or(parent).to_path_buf()
        } else {
            parent.to_path_buf()
        };
        Self::from_bytes(&data, path.to_path_buf(), root)
    }

    /// Parse KEY bytes with an explicit BIF root directory.
    ///
    /// # Errors
    /// Returns an error if the KEY is malformed.
    pub fn from_bytes(data: &[u8], path: PathBuf, root: PathBuf) -> Result<Self> {
        if data.len() < KEY_HEADER_SIZE {
            return Err(Error::TruncatedHeader {
                format: "KEY",
                needed: KEY_HEADER_SIZE,
                available: data.len(),
            });
        }

        let mut cursor = Cursor::new(data);
        let mut magic = [0u8; 4];
        cursor.read_exact(&mut magic)?;
        if &magic != b"KEY " {
            return Err(Error::InvalidMagic { format: "KEY", found: magic });
        }
        let mut version = [0u8; 4];
        cursor.read_exact(&mut version)?;
        if &version != b"V1  " && &version != b"V1.1" {
            return Err(Error::UnsupportedVersion {
                format: "KEY",
                version: String::from_utf8_lossy(&version).into_owned(),
            });
        }

        let bif_count = cursor.read_u32::<LittleEndian>()?;
        let key_count = cursor.read_u32::<LittleEndian>()?;
        let file_table_offset = u64::from(cursor.read_u32::<LittleEndian>()?);
        let key_table_offset = u64::from(cursor.read_u32::<LittleEndian>()?);

        let file_table = slice(data, "KEY file table", file_table_offset, u64::from(bif_count) * KEY_FILE_ENTRY_SIZE as u64)?;
        let mut bifs = Vec::with_capacity(bif_count as usize);
        let mut files = Cursor::new(file_table);
        for _ in 0..bif_count {
            let size = files.read_u32::<LittleEndian>()?;
            let name_offset = u64::from(files.read_u32::<LittleEndian>()?);
            let name_size = u64::from(files.read_u16::<LittleEndian>()?);
            let _drives = files.read_u16::<LittleEndian>()?;

            let raw = slice(data, "KEY file names", name_offset, name_size)?;
            let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
            bifs.push(BifReference {
                name: decode_cp1252(&raw[..end]).into_owned(),
                size,
            });
        }

        let key_table = slice(data, "KEY key table", key_table_offset, u64::from(key_count) * KEY_ENTRY_SIZE as u64)?;
        let mut keys = Vec::with_capacity(key_count as usize);
        let mut index = HashMap::with_capacity(key_count as usize);
        let mut records = Cursor::new(key_table);
        let mut name = [0u8; 16];
        for _ in 0..key_count {
            records.read_exact(&mut name)?;
            let res_type = ResourceType(records.read_u16::<LittleEndian>()?);
            let res_id = records.read_u32::<LittleEndian>()?;
            let entry = KeyEntry {
                resref: ResRef::from_padded(&name),
                res_type,
                res_id,
            };
            index.entry(entry.resref.key(res_type)).or_insert(keys.len());
            keys.push(entry);
        }

        tracing::info!(
            "Indexed KEY {} ({} BIFs, {} resources)",
            path.display(),
            bifs.len(),
            keys.len()
        );

        Ok(Self {
            path,
            root,
            bifs,
            keys,
            index,
            open_bifs: RwLock::new(HashMap::new()),
        })
    }

    /// BIF paths as listed in the KEY, separators normalized.
    #[must_use]
    pub fn bif_names(&self) -> Vec<String> {
        self.bifs.iter().map(|b| normalize_path(&b.name)).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Open (or reuse) the BIF with this index.
    fn bif(&self, bif_index: u32) -> Result<Arc<BifFile>> {
        if let Some(bif) = self.open_bifs.read().get(&bif_index) {
            return Ok(Arc::clone(bif));
        }

        let reference = usize::try_from(bif_index)
            .ok()
            .and_then(|i| self.bifs.get(i))
            .ok_or_else(|| Error::bounds("KEY file table", u64::from(bif_index), self.bifs.len() as u64))?;
        let path = resolve_relative_path(&self.root, &reference.name).ok_or_else(|| Error::BifMissing {
            path: self.root.join(normalize_path(&reference.name)),
        })?;

        let bif = Arc::new(BifFile::open(&path)?);
        if u64::from(reference.size) != bif.storage.len() {
            tracing::debug!(
                "BIF {} is {} bytes, KEY says {}",
                path.display(),
                bif.storage.len(),
                reference.size
            );
        }

        let mut open = self.open_bifs.write();
        Ok(Arc::clone(open.entry(bif_index).or_insert(bif)))
    }
}

impl ResourceContainer for KeyBifContainer {
    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn kind(&self) -> ContainerKind {
        ContainerKind::KeyBif
    }

    fn keys(&self) -> Vec<ResourceKey> {
        self.keys.iter().map(|k| k.resref.key(k.res_type)).collect()
    }

    fn contains(&self, key: &ResourceKey) -> bool {
        self.index.contains_key(key)
    }

    fn read(&self, key: &ResourceKey) -> Result<Option<Vec<u8>>> {
        let Some(&i) = self.index.get(key) else {
            return Ok(None);
        };
        let (bif_index, entry_index) = split_res_id(self.keys[i].res_id);
        let bif = self.bif(bif_index)?;
        bif.read_index(entry_index).map(Some)
    }
}

/// A BIF data file.
#[derive(Debug)]
pub struct BifFile {
    entries: Vec<(u32, ResourceEntry)>,
    storage: ContainerStorage,
}

impl BifFile {
    /// Open a BIF in on-demand mode.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or its table is malformed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_storage(ContainerStorage::open(path)?)
    }

    /// Parse a BIF from memory.
    ///
    /// # Errors
    /// Returns an error if the table is malformed.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_storage(ContainerStorage::from_bytes(data))
    }

    fn from_storage(storage: ContainerStorage) -> Result<Self> {
        let header = storage.read_prefix(BIF_HEADER_SIZE as u64)?;
        if header.len() < BIF_HEADER_SIZE {
            return Err(Error::TruncatedHeader {
                format: "BIF",
                needed: BIF_HEADER_SIZE,
                available: header.len(),
            });
        }
        let mut cursor = Cursor::new(header.as_slice());
        let mut magic = [0u8; 4];
        cursor.read_exact(&mut magic)?;
        if &magic != b"BIFF" {
            return Err(Error::InvalidMagic { format: "BIF", found: magic });
        }
        let mut version = [0u8; 4];
        cursor.read_exact(&mut version)?;
        if &version != b"V1  " {
            return Err(Error::UnsupportedVersion {
                format: "BIF",
                version: String::from_utf8_lossy(&version).into_owned(),
            });
        }
        let count = cursor.read_u32::<LittleEndian>()?;
        let _fixed_count = cursor.read_u32::<LittleEndian>()?;
        let table_offset = u64::from(cursor.read_u32::<LittleEndian>()?);

        let table = storage.read_range("BIF resource table", table_offset, u64::from(count) * BIF_ENTRY_SIZE as u64)?;
        let mut records = Cursor::new(table.as_slice());
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let id = records.read_u32::<LittleEndian>()?;
            let offset = records.read_u32::<LittleEndian>()?;
            let size = records.read_u32::<LittleEndian>()?;
            let res_type = ResourceType(records.read_u32::<LittleEndian>()? as u16);
            entries.push((
                id,
                ResourceEntry {
                    resref: ResRef::default(),
                    res_type,
                    offset,
                    size,
                },
            ));
        }

        Ok(Self { entries, storage })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read the entry at a table position.
    ///
    /// # Errors
    /// Returns [`Error::BoundsViolation`] for an index past the table or a bad
    /// extent, [`Error::OverflowDetected`] for an overflowing one.
    pub fn read_index(&self, entry_index: u32) -> Result<Vec<u8>> {
        let (_, entry) = usize::try_from(entry_index)
            .ok()
            .and_then(|i| self.entries.get(i))
            .ok_or_else(|| Error::bounds("BIF resource table", u64::from(entry_index), self.entries.len() as u64))?;
        self.storage
            .read_range("BIF resource", u64::from(entry.offset), u64::from(entry.size))
    }
}

fn slice<'a>(data: &'a [u8], section: &'static str, offset: u64, len: u64) -> Result<&'a [u8]> {
    let limit = data.len() as u64;
    let end = offset + len;
    if end > limit {
        return Err(Error::bounds(section, end, limit));
    }
    // Bounded by the slice length above.
    Ok(&data[offset as usize..end as usize])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::KeyBifWriter;
    use tempfile::TempDir;

    fn install() -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let mut writer = KeyBifWriter::new();
        let bif = writer.add_bif("data\\base_2da.bif");
        writer.add(bif, "classes", ResourceType::TWODA, b"2DA V2.0\n".to_vec()).unwrap();
        writer.add(bif, "feat", ResourceType::TWODA, b"feat".to_vec()).unwrap();
        let other = writer.add_bif("data\\templates.bif");
        writer.add(other, "nw_chicken", ResourceType::UTC, b"chicken".to_vec()).unwrap();
        let key_path = writer.write(temp.path(), "chitin.key").unwrap();
        (temp, key_path)
    }

    #[test]
    fn test_read_through_key() {
        let (_temp, key_path) = install();
        let container = KeyBifContainer::open(&key_path).unwrap();
        assert_eq!(container.len(), 3);
        assert_eq!(container.bif_names(), vec!["data/base_2da.bif", "data/templates.bif"]);

        let key = ResourceKey::new("FEAT", ResourceType::TWODA);
        assert_eq!(container.read(&key).unwrap().as_deref(), Some(&b"feat"[..]));
        let key = ResourceKey::new("nw_chicken", ResourceType::UTC);
        assert_eq!(container.read(&key).unwrap().as_deref(), Some(&b"chicken"[..]));
        assert_eq!(container.read(&ResourceKey::new("nope", ResourceType::UTC)).unwrap(), None);
        assert_eq!(container.open_bifs.read().len(), 2);
    }

    #[test]
    fn test_missing_bif() {
        let (temp, key_path) = install();
        std::fs::remove_file(temp.path().join("data").join("templates.bif")).unwrap();
        let container = KeyBifContainer::open(&key_path).unwrap();
        let err = container.read(&ResourceKey::new("nw_chicken", ResourceType::UTC)).unwrap_err();
        assert!(matches!(err, Error::BifMissing { .. }));
        // Other BIFs stay readable.
        assert!(container.read(&ResourceKey::new("classes", ResourceType::TWODA)).unwrap().is_some());
    }

    #[test]
    fn test_bif_index_out_of_range() {
        let mut data = Vec::new();
        data.extend_from_slice(b"BIFFV1  ");
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&20u32.to_le_bytes());
        let bif = BifFile::from_bytes(data).unwrap();
        assert!(bif.is_empty());
        assert!(matches!(bif.read_index(0), Err(Error::BoundsViolation { .. })));
    }
}
