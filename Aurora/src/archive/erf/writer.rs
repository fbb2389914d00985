//! ERF archive writer

use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use super::{ERF_HEADER_SIZE, ErfType, ErfVersion, RESOURCE_ENTRY_SIZE};
use crate::error::{Error, Result};
use crate::formats::common::{ResRef, ResourceType, encode_cp1252};
use crate::formats::gff::{Gender, Language, LocSubString};

/// Builds ERF/HAK/MOD archives in memory.
#[derive(Debug, Clone)]
pub struct ErfWriter {
    erf_type: ErfType,
    version: ErfVersion,
    build_year: u32,
    build_day: u32,
    description_strref: u32,
    descriptions: Vec<LocSubString>,
    resources: Vec<(ResRef, ResourceType, Vec<u8>)>,
}

impl ErfWriter {
    #[must_use]
    pub fn new(erf_type: ErfType) -> Self {
        Self {
            erf_type,
            version: ErfVersion::V1_0,
            build_year: 0,
            build_day: 0,
            description_strref: 0xFFFF_FFFF,
            descriptions: Vec::new(),
            resources: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: ErfVersion) -> Self {
        self.version = version;
        self
    }

    /// Build date as (years since 1900, day of year).
    #[must_use]
    pub fn with_build_date(mut self, year: u32, day: u32) -> Self {
        self.build_year = year;
        self.build_day = day;
        self
    }

    #[must_use]
    pub fn with_description_strref(mut self, str_ref: u32) -> Self {
        self.description_strref = str_ref;
        self
    }

    pub fn add_description(&mut self, language: Language, gender: Gender, text: impl Into<String>) {
        self.descriptions.push(LocSubString::new(language, gender, text));
    }

    /// Queue a resource.
    ///
    /// # Errors
    /// Returns [`Error::ResRefTooLong`] if the name does not fit this version's
    /// key slot.
    pub fn add(&mut self, name: &str, res_type: ResourceType, data: Vec<u8>) -> Result<()> {
        let resref = ResRef::with_limit(name, self.version.resref_len())?;
        self.resources.push((resref, res_type, data));
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Write the archive to disk.
    ///
    /// # Errors
    /// Returns an error if the archive exceeds 4 GiB or the file cannot be
    /// written.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_bytes()?)?;
        tracing::info!(
            "Wrote {} with {} resources to {}",
            self.erf_type.as_str(),
            self.resources.len(),
            path.display()
        );
        Ok(())
    }

    /// Serialize the archive.
    ///
    /// # Errors
    /// Returns [`Error::ArchiveTooLarge`] if any offset exceeds 32 bits.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut localized = Vec::new();
        for description in &self.descriptions {
            let text = encode_cp1252(&description.text);
            localized.write_u32::<LittleEndian>(description.id)?;
            localized.write_u32::<LittleEndian>(to_u32(text.len())?)?;
            localized.extend_from_slice(&text);
        }

        let count = self.resources.len();
        let key_size = self.version.key_entry_size();
        let localized_offset = ERF_HEADER_SIZE;
        let keys_offset = localized_offset + localized.len();
        let resources_offset = keys_offset + count * key_size;
        let data_offset = resources_offset + count * RESOURCE_ENTRY_SIZE;

        let mut output = Vec::with_capacity(data_offset);
        output.extend_from_slice(self.erf_type.magic());
        output.extend_from_slice(self.version.tag());
        output.write_u32::<LittleEndian>(to_u32(self.descriptions.len())?)?;
        output.write_u32::<LittleEndian>(to_u32(localized.len())?)?;
        output.write_u32::<LittleEndian>(to_u32(count)?)?;
        output.write_u32::<LittleEndian>(to_u32(localized_offset)?)?;
        output.write_u32::<LittleEndian>(to_u32(keys_offset)?)?;
        output.write_u32::<LittleEndian>(to_u32(resources_offset)?)?;
        output.write_u32::<LittleEndian>(self.build_year)?;
        output.write_u32::<LittleEndian>(self.build_day)?;
        output.write_u32::<LittleEndian>(self.description_strref)?;
        output.resize(ERF_HEADER_SIZE, 0);

        output.extend_from_slice(&localized);

        for (id, (resref, res_type, _)) in self.resources.iter().enumerate() {
            let name = match self.version {
                ErfVersion::V1_0 => resref.to_padded::<16>().to_vec(),
                ErfVersion::V1_1 => resref.to_padded::<32>().to_vec(),
            };
            output.extend_from_slice(&name);
            output.write_u32::<LittleEndian>(to_u32(id)?)?;
            output.write_u16::<LittleEndian>(res_type.id())?;
            output.write_u16::<LittleEndian>(0)?;
        }

        let mut offset = data_offset;
        for (_, _, data) in &self.resources {
            output.write_u32::<LittleEndian>(to_u32(offset)?)?;
            output.write_u32::<LittleEndian>(to_u32(data.len())?)?;
            offset += data.len();
        }
        to_u32(offset)?;

        for (_, _, data) in &self.resources {
            output.extend_from_slice(data);
        }
        Ok(output)
    }
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::ArchiveTooLarge(format!("ERF offset {value} exceeds 4 GiB")))
}
