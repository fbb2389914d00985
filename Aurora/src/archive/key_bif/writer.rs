//! KEY/BIF writer

use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};

use super::{BIF_ENTRY_SIZE, BIF_HEADER_SIZE, KEY_ENTRY_SIZE, KEY_FILE_ENTRY_SIZE, KEY_HEADER_SIZE, MAX_BIF_INDEX, pack_res_id};
use crate::error::{Error, Result};
use crate::formats::common::{ResRef, ResourceType, encode_cp1252};
use crate::utils::normalize_path;

#[derive(Debug, Clone, Default)]
struct PendingBif {
    /// Path relative to the install root, backslash separated.
    name: String,
    resources: Vec<(ResRef, ResourceType, Vec<u8>)>,
}

/// Builds a KEY file and the BIFs it references.
#[derive(Debug, Clone, Default)]
pub struct KeyBifWriter {
    bifs: Vec<PendingBif>,
}

impl KeyBifWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a BIF by its install-relative path, e.g. `data\\2da.bif`.
    /// Returns its index for [`KeyBifWriter::add`].
    pub fn add_bif(&mut self, name: &str) -> usize {
        self.bifs.push(PendingBif {
            name: name.replace('/', "\\"),
            resources: Vec::new(),
        });
        self.bifs.len() - 1
    }

    /// Queue a resource in a registered BIF.
    ///
    /// # Errors
    /// Returns [`Error::ResRefTooLong`] for names over 16 bytes or
    /// [`Error::ArchiveTooLarge`] for an unknown BIF index.
    pub fn add(&mut self, bif: usize, name: &str, res_type: ResourceType, data: Vec<u8>) -> Result<()> {
        let resref = ResRef::new(name)?;
        let pending = self
            .bifs
            .get_mut(bif)
            .ok_or_else(|| Error::ArchiveTooLarge(format!("no BIF registered at index {bif}")))?;
        pending.resources.push((resref, res_type, data));
        Ok(())
    }

    /// Serialize to (KEY bytes, [(relative BIF path, BIF bytes)]).
    ///
    /// # Errors
    /// Returns [`Error::ArchiveTooLarge`] when a BIF index or entry count
    /// does not fit the packed resource id, or offsets exceed 32 bits.
    pub fn build(&self) -> Result<(Vec<u8>, Vec<(String, Vec<u8>)>)> {
        if self.bifs.len() > MAX_BIF_INDEX as usize + 1 {
            return Err(Error::ArchiveTooLarge(format!("{} BIFs", self.bifs.len())));
        }

        let mut bif_files = Vec::with_capacity(self.bifs.len());
        let mut keys = Vec::new();
        for (bif_index, bif) in self.bifs.iter().enumerate() {
            let bytes = build_bif(bif_index as u32, &bif.resources)?;
            for (entry_index, (resref, res_type, _)) in bif.resources.iter().enumerate() {
                keys.push((resref, *res_type, pack_res_id(bif_index as u32, entry_index as u32)));
            }
            bif_files.push((bif.name.clone(), bytes));
        }

        let mut names = Vec::new();
        let names_offset = KEY_HEADER_SIZE + self.bifs.len() * KEY_FILE_ENTRY_SIZE;
        let mut file_table = Vec::new();
        for (bif, (_, bytes)) in self.bifs.iter().zip(&bif_files) {
            let mut name = encode_cp1252(&bif.name);
            name.push(0);
            file_table.write_u32::<LittleEndian>(to_u32(bytes.len())?)?;
            file_table.write_u32::<LittleEndian>(to_u32(names_offset + names.len())?)?;
            file_table.write_u16::<LittleEndian>(
                u16::try_from(name.len()).map_err(|_| Error::ArchiveTooLarge(format!("BIF name {}", bif.name)))?,
            )?;
            // Drive flags: install directory.
            file_table.write_u16::<LittleEndian>(1)?;
            names.extend_from_slice(&name);
        }

        let key_table_offset = names_offset + names.len();
        let mut output = Vec::with_capacity(key_table_offset + keys.len() * KEY_ENTRY_SIZE);
        output.extend_from_slice(b"KEY V1  ");
        output.write_u32::<LittleEndian>(to_u32(self.bifs.len())?)?;
        output.write_u32::<LittleEndian>(to_u32(keys.len())?)?;
        output.write_u32::<LittleEndian>(to_u32(KEY_HEADER_SIZE)?)?;
        output.write_u32::<LittleEndian>(to_u32(key_table_offset)?)?;
        output.write_u32::<LittleEndian>(0)?;
        output.write_u32::<LittleEndian>(0)?;
        output.resize(KEY_HEADER_SIZE, 0);
        output.extend_from_slice(&file_table);
        output.extend_from_slice(&names);

        for (resref, res_type, res_id) in keys {
            output.extend_from_slice(&resref.to_padded::<16>());
            output.write_u16::<LittleEndian>(res_type.id())?;
            output.write_u32::<LittleEndian>(res_id)?;
        }

        Ok((output, bif_files))
    }

    /// Write the KEY as `root/key_name` and each BIF at its relative path
    /// under `root`. Returns the KEY path.
    ///
    /// # Errors
    /// Returns an error if serialization or any write fails.
    pub fn write<P: AsRef<Path>>(&self, root: P, key_name: &str) -> Result<PathBuf> {
        let root = root.as_ref();
        let (key, bifs) = self.build()?;
        for (name, bytes) in bifs {
            let path = root.join(normalize_path(&name));
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, bytes)?;
        }
        let key_path = root.join(key_name);
        std::fs::write(&key_path, key)?;
        tracing::info!("Wrote {} with {} BIFs", key_path.display(), self.bifs.len());
        Ok(key_path)
    }
}

fn build_bif(bif_index: u32, resources: &[(ResRef, ResourceType, Vec<u8>)]) -> Result<Vec<u8>> {
    if resources.len() > (1 << super::RES_INDEX_BITS) {
        return Err(Error::ArchiveTooLarge(format!("{} resources in one BIF", resources.len())));
    }
    let data_offset = BIF_HEADER_SIZE + resources.len() * BIF_ENTRY_SIZE;

    let mut output = Vec::with_capacity(data_offset);
    output.extend_from_slice(b"BIFFV1  ");
    output.write_u32::<LittleEndian>(to_u32(resources.len())?)?;
    output.write_u32::<LittleEndian>(0)?;
    output.write_u32::<LittleEndian>(to_u32(BIF_HEADER_SIZE)?)?;

    let mut offset = data_offset;
    for (index, (_, res_type, data)) in resources.iter().enumerate() {
        output.write_u32::<LittleEndian>(pack_res_id(bif_index, index as u32))?;
        output.write_u32::<LittleEndian>(to_u32(offset)?)?;
        output.write_u32::<LittleEndian>(to_u32(data.len())?)?;
        output.write_u32::<LittleEndian>(u32::from(res_type.id()))?;
        offset += data.len();
    }
    to_u32(offset)?;

    for (_, _, data) in resources {
        output.extend_from_slice(data);
    }
    Ok(output)
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::ArchiveTooLarge(format!("offset {value} exceeds 4 GiB")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::BifFile;

    #[test]
    fn test_build_layout() {
        let mut writer = KeyBifWriter::new();
        let bif = writer.add_bif("data/scripts.bif");
        writer.add(bif, "nw_s0_fireball", ResourceType::NCS, vec![1, 2, 3]).unwrap();
        let (key, bifs) = writer.build().unwrap();

        assert_eq!(&key[0..8], b"KEY V1  ");
        assert_eq!(bifs[0].0, "data\\scripts.bif");
        // One file entry, then "data\scripts.bif\0", then one key.
        assert_eq!(key.len(), 64 + 12 + 17 + 22);

        let bif = BifFile::from_bytes(bifs[0].1.clone()).unwrap();
        assert_eq!(bif.len(), 1);
        assert_eq!(bif.read_index(0).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_unknown_bif_index() {
        let mut writer = KeyBifWriter::new();
        assert!(writer.add(0, "x", ResourceType::NCS, Vec::new()).is_err());
    }
}
