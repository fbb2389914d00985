//! TLK file writing and serialization

use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use super::{TLK_ENTRY_SIZE, TLK_HEADER_SIZE, TalkTable};
use crate::error::{Error, Result};
use crate::formats::common::{RESREF_MAX_LEN, encode_cp1252};

/// Write a TLK table to disk
///
/// # Errors
/// Returns an error if serialization fails or the file cannot be written.
pub fn write_tlk<P: AsRef<Path>>(table: &TalkTable, path: P) -> Result<()> {
    let bytes = serialize_tlk(table)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Serialize a TLK table to bytes
///
/// # Errors
/// Returns [`Error::ResRefTooLong`] for sound resrefs over 16 bytes and
/// [`Error::ArchiveTooLarge`] when offsets exceed 32 bits.
pub fn serialize_tlk(table: &TalkTable) -> Result<Vec<u8>> {
    let count = u32::try_from(table.entries.len())
        .map_err(|_| Error::ArchiveTooLarge("too many TLK entries".to_string()))?;
    let strings_offset = TLK_HEADER_SIZE + table.entries.len() * TLK_ENTRY_SIZE;

    let mut output = Vec::with_capacity(strings_offset);
    output.extend_from_slice(b"TLK V3.0");
    output.write_u32::<LittleEndian>(table.language_id)?;
    output.write_u32::<LittleEndian>(count)?;
    output.write_u32::<LittleEndian>(to_u32(strings_offset)?)?;

    let mut strings = Vec::new();
    for entry in &table.entries {
        let (offset, size) = match &entry.text {
            Some(text) => {
                let bytes = encode_cp1252(text);
                let offset = to_u32(strings.len())?;
                strings.extend_from_slice(&bytes);
                (offset, to_u32(bytes.len())?)
            }
            None => (0, 0),
        };

        let sound = match &entry.sound {
            Some(resref) => {
                if encode_cp1252(resref.as_str()).len() > RESREF_MAX_LEN {
                    return Err(Error::ResRefTooLong {
                        name: resref.to_string(),
                        max: RESREF_MAX_LEN,
                    });
                }
                resref.to_padded::<16>()
            }
            None => [0u8; 16],
        };

        output.write_u32::<LittleEndian>(entry.flags())?;
        output.extend_from_slice(&sound);
        output.write_u32::<LittleEndian>(entry.volume_variance)?;
        output.write_u32::<LittleEndian>(entry.pitch_variance)?;
        output.write_u32::<LittleEndian>(offset)?;
        output.write_u32::<LittleEndian>(size)?;
        output.write_f32::<LittleEndian>(entry.sound_length.unwrap_or(0.0))?;
    }

    to_u32(strings_offset + strings.len())?;
    output.extend_from_slice(&strings);
    Ok(output)
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::ArchiveTooLarge("TLK string data exceeds 4 GiB".to_string()))
}
