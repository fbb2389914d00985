//! ERF archive reader
//!
//! Archives can be read fully into memory ([`ErfArchive::load`],
//! [`ErfArchive::from_bytes`]) or opened metadata-only ([`ErfArchive::open`]),
//! in which case only the directory is read up front and resources are
//! extracted on demand. Large HAKs should always use the latter.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};

use super::{ERF_HEADER_SIZE, ErfType, ErfVersion, RESOURCE_ENTRY_SIZE};
use crate::archive::{ContainerKind, ContainerStorage, ResourceContainer, ResourceEntry};
use crate::error::{Error, Result};
use crate::formats::common::{ResRef, ResourceKey, ResourceType, decode_cp1252};
use crate::formats::gff::LocSubString;

/// Parsed ERF header fields that are kept after opening.
#[derive(Debug, Clone, Copy)]
struct ErfHeader {
    erf_type: ErfType,
    version: ErfVersion,
    language_count: u32,
    localized_size: u32,
    entry_count: u32,
    localized_offset: u32,
    keys_offset: u32,
    resources_offset: u32,
    build_year: u32,
    build_day: u32,
    description_strref: u32,
}

/// An opened ERF/HAK/MOD archive.
#[derive(Debug)]
pub struct ErfArchive {
    path: Option<PathBuf>,
    header: ErfHeader,
    descriptions: Vec<LocSubString>,
    entries: Vec<ResourceEntry>,
    /// First entry for each key.
    index: HashMap<ResourceKey, usize>,
    storage: ContainerStorage,
}

impl ErfArchive {
    /// Open an archive reading only its directory.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or its header or
    /// directory is malformed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        Self::from_storage(ContainerStorage::open(path)?, Some(path.to_path_buf()))
    }

    /// Read an archive fully into memory.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is malformed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        Self::from_storage(ContainerStorage::load(path)?, Some(path.to_path_buf()))
    }

    /// Parse an in-memory archive.
    ///
    /// # Errors
    /// Returns an error if the data is malformed.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_storage(ContainerStorage::from_bytes(data), None)
    }

    /// Parse the directory from any storage.
    ///
    /// # Errors
    /// Returns an error if the header or directory is malformed.
    pub fn from_storage(storage: ContainerStorage, path: Option<PathBuf>) -> Result<Self> {
        let header = read_header(&storage)?;
        let descriptions = read_descriptions(&storage, &header)?;
        let entries = read_entries(&storage, &header)?;

        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            index.entry(entry.key()).or_insert(i);
        }
        if index.len() != entries.len() {
            tracing::debug!(
                "ERF {}: {} duplicate keys, first entry wins",
                path.as_deref().unwrap_or(Path::new("<memory>")).display(),
                entries.len() - index.len()
            );
        }

        tracing::debug!(
            "Opened {} archive with {} entries ({})",
            header.erf_type.as_str(),
            entries.len(),
            if storage.is_memory() { "memory" } else { "on demand" }
        );

        Ok(Self {
            path,
            header,
            descriptions,
            entries,
            index,
            storage,
        })
    }

    #[must_use]
    pub fn erf_type(&self) -> ErfType {
        self.header.erf_type
    }

    #[must_use]
    pub fn version(&self) -> ErfVersion {
        self.header.version
    }

    /// Build date as (years since 1900, day of year).
    #[must_use]
    pub fn build_date(&self) -> (u32, u32) {
        (self.header.build_year, self.header.build_day)
    }

    #[must_use]
    pub fn description_strref(&self) -> u32 {
        self.header.description_strref
    }

    /// Localized description strings.
    #[must_use]
    pub fn descriptions(&self) -> &[LocSubString] {
        &self.descriptions
    }

    /// Directory entries in on-disk order.
    #[must_use]
    pub fn entries(&self) -> &[ResourceEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a resource's directory entry.
    #[must_use]
    pub fn entry(&self, key: &ResourceKey) -> Option<&ResourceEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    /// Extract the bytes of one directory entry.
    ///
    /// # Errors
    /// Returns [`Error::OverflowDetected`] or [`Error::BoundsViolation`] for a
    /// bad extent, or an IO error.
    pub fn read_entry(&self, entry: &ResourceEntry) -> Result<Vec<u8>> {
        self.storage
            .read_range("ERF resource", u64::from(entry.offset), u64::from(entry.size))
    }

    /// Extract by name and type.
    ///
    /// # Errors
    /// See [`ErfArchive::read_entry`].
    pub fn read_resource(&self, name: &str, res_type: ResourceType) -> Result<Option<Vec<u8>>> {
        self.read(&ResourceKey::new(name, res_type))
    }

    /// Extract every resource into `dest` as `name.ext` files.
    ///
    /// Returns the number of files written.
    ///
    /// # Errors
    /// Returns an error if a resource cannot be read or written.
    pub fn extract_all<P: AsRef<Path>>(&self, dest: P) -> Result<usize> {
        let dest = dest.as_ref();
        std::fs::create_dir_all(dest)?;
        let mut written = 0;
        for entry in &self.entries {
            let key = entry.key();
            let Some(file_name) = key.file_name() else {
                tracing::warn!("Skipping {key}: no plain file name for type {}", entry.res_type);
                continue;
            };
            let data = self.read_entry(entry)?;
            std::fs::write(dest.join(file_name), data)?;
            written += 1;
        }
        tracing::info!("Extracted {written} resources to {}", dest.display());
        Ok(written)
    }
}

impl ResourceContainer for ErfArchive {
    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn kind(&self) -> ContainerKind {
        ContainerKind::Erf(self.header.erf_type)
    }

    fn keys(&self) -> Vec<ResourceKey> {
        self.entries.iter().map(ResourceEntry::key).collect()
    }

    fn contains(&self, key: &ResourceKey) -> bool {
        self.index.contains_key(key)
    }

    fn read(&self, key: &ResourceKey) -> Result<Option<Vec<u8>>> {
        match self.entry(key) {
            Some(entry) => self.read_entry(entry).map(Some),
            None => Ok(None),
        }
    }
}

fn read_header(storage: &ContainerStorage) -> Result<ErfHeader> {
    let bytes = storage.read_prefix(ERF_HEADER_SIZE as u64)?;
    if bytes.len() < ERF_HEADER_SIZE {
        return Err(Error::TruncatedHeader {
            format: "ERF",
            needed: ERF_HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let mut cursor = Cursor::new(bytes.as_slice());
    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic)?;
    let erf_type = ErfType::from_magic(&magic).ok_or(Error::InvalidMagic { format: "ERF", found: magic })?;

    let mut tag = [0u8; 4];
    cursor.read_exact(&mut tag)?;
    let version = ErfVersion::from_tag(&tag).ok_or_else(|| Error::UnsupportedVersion {
        format: "ERF",
        version: String::from_utf8_lossy(&tag).into_owned(),
    })?;

    Ok(ErfHeader {
        erf_type,
        version,
        language_count: cursor.read_u32::<LittleEndian>()?,
        localized_size: cursor.read_u32::<LittleEndian>()?,
        entry_count: cursor.read_u32::<LittleEndian>()?,
        localized_offset: cursor.read_u32::<LittleEndian>()?,
        keys_offset: cursor.read_u32::<LittleEndian>()?,
        resources_offset: cursor.read_u32::<LittleEndian>()?,
        build_year: cursor.read_u32::<LittleEndian>()?,
        build_day: cursor.read_u32::<LittleEndian>()?,
        description_strref: cursor.read_u32::<LittleEndian>()?,
    })
}

fn read_descriptions(storage: &ContainerStorage, header: &ErfHeader) -> Result<Vec<LocSubString>> {
    if header.language_count == 0 {
        return Ok(Vec::new());
    }
    let bytes = storage.read_range(
        "ERF localized strings",
        u64::from(header.localized_offset),
        u64::from(header.localized_size),
    )?;

    let limit = bytes.len() as u64;
    let mut cursor = Cursor::new(bytes.as_slice());
    let mut strings = Vec::new();
    for _ in 0..header.language_count {
        let id = cursor.read_u32::<LittleEndian>()?;
        let size = u64::from(cursor.read_u32::<LittleEndian>()?);
        let start = cursor.position();
        let end = start + size;
        if end > limit {
            return Err(Error::bounds("ERF localized strings", end, limit));
        }
        // Trailing NULs are common in toolset-written descriptions.
        let text = &bytes[start as usize..end as usize];
        let text = text.strip_suffix(&[0]).unwrap_or(text);
        strings.push(LocSubString {
            id,
            text: decode_cp1252(text).into_owned(),
        });
        cursor.set_position(end);
    }
    Ok(strings)
}

fn read_entries(storage: &ContainerStorage, header: &ErfHeader) -> Result<Vec<ResourceEntry>> {
    let count = u64::from(header.entry_count);
    let key_size = header.version.key_entry_size();
    let keys = storage.read_range(
        "ERF key list",
        u64::from(header.keys_offset),
        count * key_size as u64,
    )?;
    let resources = storage.read_range(
        "ERF resource list",
        u64::from(header.resources_offset),
        count * RESOURCE_ENTRY_SIZE as u64,
    )?;

    let resref_len = header.version.resref_len();
    let mut key_cursor = Cursor::new(keys.as_slice());
    let mut res_cursor = Cursor::new(resources.as_slice());
    let mut entries = Vec::with_capacity(header.entry_count as usize);
    let mut name = vec![0u8; resref_len];
    for _ in 0..header.entry_count {
        key_cursor.read_exact(&mut name)?;
        let _res_id = key_cursor.read_u32::<LittleEndian>()?;
        let res_type = ResourceType(key_cursor.read_u16::<LittleEndian>()?);
        let _unused = key_cursor.read_u16::<LittleEndian>()?;

        entries.push(ResourceEntry {
            resref: ResRef::from_padded(&name),
            res_type,
            offset: res_cursor.read_u32::<LittleEndian>()?,
            size: res_cursor.read_u32::<LittleEndian>()?,
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ErfWriter;
    use crate::error::ErrorKind;
    use crate::formats::gff::{Gender, Language};

    fn sample_bytes() -> Vec<u8> {
        let mut writer = ErfWriter::new(ErfType::Mod);
        writer.add_description(Language::English, Gender::Masculine, "Test module");
        writer.add("module", ResourceType::IFO, b"ifo data".to_vec()).unwrap();
        writer.add("Area001", ResourceType::ARE, b"are data".to_vec()).unwrap();
        writer.add("area001", ResourceType::GIT, b"git".to_vec()).unwrap();
        writer.to_bytes().unwrap()
    }

    #[test]
    fn test_read_from_bytes() {
        let erf = ErfArchive::from_bytes(sample_bytes()).unwrap();
        assert_eq!(erf.erf_type(), ErfType::Mod);
        assert_eq!(erf.version(), ErfVersion::V1_0);
        assert_eq!(erf.len(), 3);
        assert_eq!(erf.entries()[1].resref.as_str(), "Area001");
        assert_eq!(erf.descriptions()[0].text, "Test module");
        assert_eq!(
            erf.read_resource("AREA001", ResourceType::ARE).unwrap().as_deref(),
            Some(&b"are data"[..])
        );
        assert_eq!(erf.read_resource("area001", ResourceType::UTC).unwrap(), None);
    }

    #[test]
    fn test_bad_magic_and_truncation() {
        let mut data = sample_bytes();
        data[0..4].copy_from_slice(b"ZZZZ");
        assert!(matches!(ErfArchive::from_bytes(data), Err(Error::InvalidMagic { .. })));

        let data = sample_bytes();
        let err = ErfArchive::from_bytes(data[..100].to_vec()).unwrap_err();
        assert!(matches!(err, Error::TruncatedHeader { .. }));
    }

    #[test]
    fn test_resource_extent_overflow() {
        let mut data = sample_bytes();
        // First resource list entry lives at the offset stored in the header.
        let res_offset = u32::from_le_bytes(data[28..32].try_into().unwrap()) as usize;
        data[res_offset..res_offset + 4].copy_from_slice(&0xFFFF_FFFEu32.to_le_bytes());
        data[res_offset + 4..res_offset + 8].copy_from_slice(&0x10u32.to_le_bytes());

        let erf = ErfArchive::from_bytes(data).unwrap();
        let err = erf.read_resource("module", ResourceType::IFO).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OverflowDetected);
    }
}
