//! TLK file reading and parsing

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use super::{FLAG_SOUND, FLAG_SOUND_LENGTH, FLAG_TEXT, TLK_ENTRY_SIZE, TLK_HEADER_SIZE, TalkTable, TlkEntry};
use crate::error::{Error, Result};
use crate::formats::common::{ResRef, decode_cp1252};

/// Read a TLK file from disk
///
/// # Errors
/// Returns an error if the file cannot be read or is not a valid TLK.
pub fn read_tlk<P: AsRef<Path>>(path: P) -> Result<TalkTable> {
    let mut file = File::open(path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    parse_tlk_bytes(&buffer)
}

/// Parse TLK data from bytes
///
/// # Errors
/// Returns [`Error::InvalidMagic`], [`Error::UnsupportedVersion`] or
/// [`Error::TruncatedHeader`] for a bad header and
/// [`Error::BoundsViolation`] when the entry table or a string lies
/// outside the buffer.
pub fn parse_tlk_bytes(data: &[u8]) -> Result<TalkTable> {
    if data.len() < TLK_HEADER_SIZE {
        return Err(Error::TruncatedHeader {
            format: "TLK",
            needed: TLK_HEADER_SIZE,
            available: data.len(),
        });
    }

    let mut cursor = Cursor::new(data);
    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic)?;
    if &magic != b"TLK " {
        return Err(Error::InvalidMagic { format: "TLK", found: magic });
    }
    let mut version = [0u8; 4];
    cursor.read_exact(&mut version)?;
    if &version != b"V3.0" {
        return Err(Error::UnsupportedVersion {
            format: "TLK",
            version: String::from_utf8_lossy(&version).into_owned(),
        });
    }

    let language_id = cursor.read_u32::<LittleEndian>()?;
    let count = cursor.read_u32::<LittleEndian>()?;
    let strings_offset = u64::from(cursor.read_u32::<LittleEndian>()?);

    let limit = data.len() as u64;
    let table_end = TLK_HEADER_SIZE as u64 + u64::from(count) * TLK_ENTRY_SIZE as u64;
    if table_end > limit {
        return Err(Error::bounds("TLK entries", table_end, limit));
    }

    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let flags = cursor.read_u32::<LittleEndian>()?;
        let mut sound = [0u8; 16];
        cursor.read_exact(&mut sound)?;
        let volume_variance = cursor.read_u32::<LittleEndian>()?;
        let pitch_variance = cursor.read_u32::<LittleEndian>()?;
        let offset = u64::from(cursor.read_u32::<LittleEndian>()?);
        let size = u64::from(cursor.read_u32::<LittleEndian>()?);
        let sound_length = cursor.read_f32::<LittleEndian>()?;

        let text = if flags & FLAG_TEXT != 0 {
            let start = strings_offset + offset;
            let end = start + size;
            if end > limit {
                return Err(Error::bounds("TLK strings", end, limit));
            }
            // Both bounded by the buffer length above.
            let bytes = &data[start as usize..end as usize];
            Some(decode_cp1252(strip_artifacts(bytes)).into_owned())
        } else {
            None
        };

        entries.push(TlkEntry {
            text,
            sound: (flags & FLAG_SOUND != 0).then(|| ResRef::from_padded(&sound)),
            sound_length: (flags & FLAG_SOUND_LENGTH != 0).then_some(sound_length),
            volume_variance,
            pitch_variance,
        });
    }

    tracing::debug!("TLK: {} entries, language {}", entries.len(), language_id);
    Ok(TalkTable { language_id, entries })
}

/// Cut the payload at its first NUL.
///
/// Legacy editors pad with NUL followed by 0xC0 bytes. A 0xC0 directly after
/// text is a real `À` and is kept.
fn strip_artifacts(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|&b| b == 0x00).unwrap_or(bytes.len());
    &bytes[..end]
}
