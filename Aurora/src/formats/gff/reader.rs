//! GFF file reading and parsing
//!
//! Decoding runs in two layers: the header and record tables are read into
//! [`RawStruct`]/[`RawField`] first, then the tree is built from struct 0,
//! resolving every offset and index against its own section.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use super::document::{GffDocument, GffField, GffStruct, GffValue, LocString, LocSubString, ROOT_STRUCT_TYPE};
use super::types::{
    FIELD_RECORD_SIZE, FieldStorage, FieldType, GffHeader, HEADER_SIZE, LABEL_SIZE, RawField,
    RawStruct, STRUCT_RECORD_SIZE, SectionInfo,
};
use crate::error::{Error, Result};
use crate::formats::common::{ResRef, decode_cp1252};

/// Read a GFF file from disk
///
/// # Errors
/// Returns an error if the file cannot be read or is not a valid GFF.
pub fn read_gff<P: AsRef<Path>>(path: P) -> Result<GffDocument> {
    let mut file = File::open(path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    parse_gff_bytes(&buffer)
}

/// Parse GFF data from bytes
///
/// # Errors
/// Returns [`Error::TruncatedHeader`] or [`Error::UnsupportedVersion`] for a
/// bad header, [`Error::BoundsViolation`] when any offset or index leaves its
/// section, [`Error::UnknownFieldType`] for an unknown type tag and
/// [`Error::GffStructCycle`] when a struct contains itself,
/// [`Error::GffStructShared`] when a struct has two parents and
/// [`Error::GffNestingTooDeep`] past [`MAX_NESTING_DEPTH`].
pub fn parse_gff_bytes(data: &[u8]) -> Result<GffDocument> {
    let header = read_header(data)?;
    let sections = Sections::new(data, &header)?;

    let structs = read_structs(sections.structs)?;
    let fields = read_fields(sections.fields)?;
    let labels = read_labels(sections.labels);

    let decoder = Decoder {
        structs: &structs,
        fields: &fields,
        labels: &labels,
        field_data: sections.field_data,
        field_indices: sections.field_indices,
        list_indices: sections.list_indices,
    };

    let root = if structs.is_empty() {
        GffStruct::new(ROOT_STRUCT_TYPE)
    } else {
        let mut walk = Walk::new(structs.len());
        decoder.build_struct(0, 0, &mut walk)?
    };

    Ok(GffDocument {
        file_type: header.file_type,
        version: header.version,
        root,
    })
}

fn read_header(data: &[u8]) -> Result<GffHeader> {
    if data.len() < HEADER_SIZE {
        return Err(Error::TruncatedHeader {
            format: "GFF",
            needed: HEADER_SIZE,
            available: data.len(),
        });
    }

    let mut cursor = Cursor::new(data);
    let mut file_type = [0u8; 4];
    cursor.read_exact(&mut file_type)?;
    let mut version = [0u8; 4];
    cursor.read_exact(&mut version)?;

    // V3.3 differs only in the type tags some later tools write.
    if &version != b"V3.2" && &version != b"V3.3" {
        return Err(Error::UnsupportedVersion {
            format: "GFF",
            version: String::from_utf8_lossy(&version).into_owned(),
        });
    }

    let mut section = || -> Result<SectionInfo> {
        Ok(SectionInfo {
            offset: cursor.read_u32::<LittleEndian>()?,
            count: cursor.read_u32::<LittleEndian>()?,
        })
    };

    Ok(GffHeader {
        file_type,
        version,
        structs: section()?,
        fields: section()?,
        labels: section()?,
        field_data: section()?,
        field_indices: section()?,
        list_indices: section()?,
    })
}

/// The six sections, each already bounds-checked against the buffer.
struct Sections<'a> {
    structs: &'a [u8],
    fields: &'a [u8],
    labels: &'a [u8],
    field_data: &'a [u8],
    field_indices: &'a [u8],
    list_indices: &'a [u8],
}

impl<'a> Sections<'a> {
    fn new(data: &'a [u8], header: &GffHeader) -> Result<Self> {
        Ok(Self {
            structs: section_slice(data, "Structs", header.structs, STRUCT_RECORD_SIZE)?,
            fields: section_slice(data, "Fields", header.fields, FIELD_RECORD_SIZE)?,
            labels: section_slice(data, "Labels", header.labels, LABEL_SIZE)?,
            field_data: section_slice(data, "FieldData", header.field_data, 1)?,
            field_indices: section_slice(data, "FieldIndices", header.field_indices, 1)?,
            list_indices: section_slice(data, "ListIndices", header.list_indices, 1)?,
        })
    }
}

fn section_slice<'a>(
    data: &'a [u8],
    name: &'static str,
    info: SectionInfo,
    record_size: usize,
) -> Result<&'a [u8]> {
    let start = u64::from(info.offset);
    let len = u64::from(info.count) * record_size as u64;
    let end = start + len;
    let limit = data.len() as u64;
    if end > limit {
        return Err(Error::bounds(name, end, limit));
    }
    let start = usize::try_from(start).map_err(|_| Error::bounds(name, start, limit))?;
    let end = usize::try_from(end).map_err(|_| Error::bounds(name, end, limit))?;
    Ok(&data[start..end])
}

fn read_structs(section: &[u8]) -> Result<Vec<RawStruct>> {
    let mut cursor = Cursor::new(section);
    let count = section.len() / STRUCT_RECORD_SIZE;
    let mut structs = Vec::with_capacity(count);
    for _ in 0..count {
        structs.push(RawStruct {
            struct_type: cursor.read_u32::<LittleEndian>()?,
            data_or_offset: cursor.read_u32::<LittleEndian>()?,
            field_count: cursor.read_u32::<LittleEndian>()?,
        });
    }
    Ok(structs)
}

fn read_fields(section: &[u8]) -> Result<Vec<RawField>> {
    let mut cursor = Cursor::new(section);
    let count = section.len() / FIELD_RECORD_SIZE;
    let mut fields = Vec::with_capacity(count);
    for _ in 0..count {
        let field_type = FieldType::from_u32(cursor.read_u32::<LittleEndian>()?)?;
        let label_index = cursor.read_u32::<LittleEndian>()?;
        let raw = cursor.read_u32::<LittleEndian>()?;
        fields.push(RawField {
            field_type,
            label_index,
            storage: field_type.storage(raw),
        });
    }
    Ok(fields)
}

/// Labels are NUL-padded to 16 bytes; a label using all 16 has no terminator.
///
/// Fields name their label by index, so decoding never matches label text:
/// an unterminated 16-byte label keeps all 16 bytes and stays distinct from a
/// shorter label sharing its prefix. Exact-match preference only matters when
/// the writer interns labels.
fn read_labels(section: &[u8]) -> Vec<String> {
    section
        .chunks_exact(LABEL_SIZE)
        .map(|chunk| {
            let end = chunk.iter().position(|&b| b == 0).unwrap_or(LABEL_SIZE);
            decode_cp1252(&chunk[..end]).into_owned()
        })
        .collect()
}

/// Deepest struct nesting the decoder follows. Game files stay in single digits.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Per-struct state while building the tree.
///
/// `on_path` marks the structs between the root and the current one; `seen`
/// is never cleared, so every struct is decoded at most once.
struct Walk {
    on_path: Vec<bool>,
    seen: Vec<bool>,
}

impl Walk {
    fn new(count: usize) -> Self {
        Self {
            on_path: vec![false; count],
            seen: vec![false; count],
        }
    }
}

/// Builds the document tree from the raw tables.
struct Decoder<'a> {
    structs: &'a [RawStruct],
    fields: &'a [RawField],
    labels: &'a [String],
    field_data: &'a [u8],
    field_indices: &'a [u8],
    list_indices: &'a [u8],
}

impl Decoder<'_> {
    fn build_struct(&self, index: u32, depth: usize, walk: &mut Walk) -> Result<GffStruct> {
        let limit = self.structs.len() as u64;
        let slot = usize::try_from(index).map_err(|_| Error::bounds("Structs", u64::from(index), limit))?;
        let raw = *self
            .structs
            .get(slot)
            .ok_or_else(|| Error::bounds("Structs", u64::from(index), limit))?;

        if walk.on_path[slot] {
            return Err(Error::GffStructCycle(index));
        }
        if walk.seen[slot] {
            return Err(Error::GffStructShared(index));
        }
        if depth > MAX_NESTING_DEPTH {
            return Err(Error::GffNestingTooDeep {
                index,
                limit: MAX_NESTING_DEPTH,
            });
        }
        walk.on_path[slot] = true;
        walk.seen[slot] = true;

        let field_ids = self.struct_field_indices(&raw)?;
        let mut fields = Vec::with_capacity(field_ids.len());
        for field_index in field_ids {
            fields.push(self.build_field(field_index, depth, walk)?);
        }

        walk.on_path[slot] = false;
        Ok(GffStruct {
            struct_type: raw.struct_type,
            fields,
        })
    }

    fn struct_field_indices(&self, raw: &RawStruct) -> Result<Vec<u32>> {
        match raw.field_count {
            0 => Ok(Vec::new()),
            1 => Ok(vec![raw.data_or_offset]),
            count => {
                let bytes = checked_range(
                    self.field_indices,
                    "FieldIndices",
                    u64::from(raw.data_or_offset),
                    u64::from(count) * 4,
                )?;
                let mut cursor = Cursor::new(bytes);
                let mut ids = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    ids.push(cursor.read_u32::<LittleEndian>()?);
                }
                Ok(ids)
            }
        }
    }

    fn build_field(&self, index: u32, depth: usize, walk: &mut Walk) -> Result<GffField> {
        let limit = self.fields.len() as u64;
        let raw = usize::try_from(index)
            .ok()
            .and_then(|i| self.fields.get(i))
            .ok_or_else(|| Error::bounds("Fields", u64::from(index), limit))?;

        let label = usize::try_from(raw.label_index)
            .ok()
            .and_then(|i| self.labels.get(i))
            .ok_or_else(|| {
                Error::bounds("Labels", u64::from(raw.label_index), self.labels.len() as u64)
            })?
            .clone();

        let value = match raw.storage {
            FieldStorage::Inline(slot) => decode_inline(raw.field_type, slot),
            FieldStorage::FieldData(offset) => self.decode_field_data(raw.field_type, offset)?,
            FieldStorage::StructIndex(child) => GffValue::Struct(self.build_struct(child, depth + 1, walk)?),
            FieldStorage::ListOffset(offset) => {
                let children = self.list_entries(offset)?;
                let mut items = Vec::with_capacity(children.len());
                for child in children {
                    items.push(self.build_struct(child, depth + 1, walk)?);
                }
                GffValue::List(items)
            }
        };

        Ok(GffField { label, value })
    }

    fn list_entries(&self, offset: u32) -> Result<Vec<u32>> {
        let head = checked_range(self.list_indices, "ListIndices", u64::from(offset), 4)?;
        let count = u32::from_le_bytes([head[0], head[1], head[2], head[3]]);
        let body = checked_range(
            self.list_indices,
            "ListIndices",
            u64::from(offset) + 4,
            u64::from(count) * 4,
        )?;
        Ok(body
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    fn data(&self, offset: u64, len: u64) -> Result<&[u8]> {
        checked_range(self.field_data, "FieldData", offset, len)
    }

    fn data_u32(&self, offset: u64) -> Result<u32> {
        let b = self.data(offset, 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn decode_field_data(&self, field_type: FieldType, offset: u32) -> Result<GffValue> {
        let offset = u64::from(offset);
        Ok(match field_type {
            FieldType::Dword64 => GffValue::Dword64(Cursor::new(self.data(offset, 8)?).read_u64::<LittleEndian>()?),
            FieldType::Int64 => GffValue::Int64(Cursor::new(self.data(offset, 8)?).read_i64::<LittleEndian>()?),
            FieldType::Double => GffValue::Double(Cursor::new(self.data(offset, 8)?).read_f64::<LittleEndian>()?),
            FieldType::ExoString => {
                let len = self.data_u32(offset)?;
                let bytes = self.data(offset + 4, u64::from(len))?;
                GffValue::String(decode_cp1252(bytes).into_owned())
            }
            FieldType::ResRef => {
                let len = self.data(offset, 1)?[0];
                let bytes = self.data(offset + 1, u64::from(len))?;
                GffValue::ResRef(ResRef::from_padded(bytes))
            }
            FieldType::ExoLocString => GffValue::LocString(self.decode_locstring(offset)?),
            FieldType::Void => {
                let len = self.data_u32(offset)?;
                GffValue::Void(self.data(offset + 4, u64::from(len))?.to_vec())
            }
            FieldType::Orientation => {
                let mut cursor = Cursor::new(self.data(offset, 16)?);
                let mut q = [0f32; 4];
                cursor.read_f32_into::<LittleEndian>(&mut q)?;
                GffValue::Orientation(q)
            }
            FieldType::Vector => {
                let mut cursor = Cursor::new(self.data(offset, 12)?);
                let mut v = [0f32; 3];
                cursor.read_f32_into::<LittleEndian>(&mut v)?;
                GffValue::Vector(v)
            }
            // Inline, struct and list types never carry a FieldData offset.
            other => return Err(Error::UnknownFieldType(other.id())),
        })
    }

    fn decode_locstring(&self, offset: u64) -> Result<LocString> {
        let total = self.data_u32(offset)?;
        // The whole payload must sit inside FieldData before any part is read.
        let body = self.data(offset + 4, u64::from(total))?;
        let body_end = offset + 4 + body.len() as u64;

        let str_ref = self.data_u32(offset + 4)?;
        let count = self.data_u32(offset + 8)?;
        let mut pos = offset + 12;
        let mut strings = Vec::new();
        for _ in 0..count {
            let id = self.data_u32(pos)?;
            let len = self.data_u32(pos + 4)?;
            let end = pos + 8 + u64::from(len);
            if end > body_end {
                return Err(Error::bounds("FieldData", end, body_end));
            }
            let bytes = self.data(pos + 8, u64::from(len))?;
            strings.push(LocSubString {
                id,
                text: decode_cp1252(bytes).into_owned(),
            });
            pos = end;
        }

        Ok(LocString { str_ref, strings })
    }
}

// The inline slot holds the value in its low bytes.
fn decode_inline(field_type: FieldType, slot: u32) -> GffValue {
    match field_type {
        FieldType::Byte => GffValue::Byte(slot as u8),
        FieldType::Char => GffValue::Char(slot as u8 as i8),
        FieldType::Word => GffValue::Word(slot as u16),
        FieldType::Short => GffValue::Short(slot as u16 as i16),
        FieldType::Int => GffValue::Int(slot as i32),
        FieldType::Float => GffValue::Float(f32::from_bits(slot)),
        _ => GffValue::Dword(slot),
    }
}

/// `section[offset..offset + len]`, computed without overflow.
fn checked_range<'a>(section: &'a [u8], name: &'static str, offset: u64, len: u64) -> Result<&'a [u8]> {
    let limit = section.len() as u64;
    let end = offset
        .checked_add(len)
        .ok_or(Error::OverflowDetected { offset, size: len })?;
    if end > limit {
        return Err(Error::bounds(name, end, limit));
    }
    // Both fit in usize: they are bounded by the slice length.
    let start = usize::try_from(offset).map_err(|_| Error::bounds(name, offset, limit))?;
    let end = usize::try_from(end).map_err(|_| Error::bounds(name, end, limit))?;
    Ok(&section[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    /// Header with every section empty and placed right after it.
    fn empty_header() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"UTC V3.2");
        for _ in 0..6 {
            data.extend_from_slice(&56u32.to_le_bytes());
            data.extend_from_slice(&0u32.to_le_bytes());
        }
        data
    }

    #[test]
    fn test_zero_structs_is_empty_root() {
        let doc = parse_gff_bytes(&empty_header()).unwrap();
        assert_eq!(&doc.file_type, b"UTC ");
        assert_eq!(doc.root.struct_type, ROOT_STRUCT_TYPE);
        assert!(doc.root.fields.is_empty());
    }

    #[test]
    fn test_truncated_header() {
        let data = empty_header();
        let err = parse_gff_bytes(&data[..20]).unwrap_err();
        assert!(matches!(err, Error::TruncatedHeader { needed: 56, available: 20, .. }));
    }

    #[test]
    fn test_bad_version() {
        let mut data = empty_header();
        data[4..8].copy_from_slice(b"V1.0");
        assert!(matches!(
            parse_gff_bytes(&data),
            Err(Error::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_section_past_end_is_bounds_violation() {
        let mut data = empty_header();
        // One struct record claimed, none present.
        data[12..16].copy_from_slice(&1u32.to_le_bytes());
        let err = parse_gff_bytes(&data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BoundsViolation);
        assert!(err.to_string().contains("Structs"));
    }

    /// Lay out a GFF from raw records: `[type, data, count]` structs and
    /// `[type, label, data]` fields.
    fn raw_gff(structs: &[[u32; 3]], fields: &[[u32; 3]], labels: &[&str], field_indices: &[u32], list_indices: &[u32]) -> Vec<u8> {
        fn push_words(body: &mut Vec<u8>, words: &[u32]) {
            for w in words {
                body.extend_from_slice(&w.to_le_bytes());
            }
        }

        let mut body = Vec::new();
        let mut sections = Vec::new();

        sections.push((56 + body.len() as u32, structs.len() as u32));
        for s in structs {
            push_words(&mut body, s);
        }
        sections.push((56 + body.len() as u32, fields.len() as u32));
        for f in fields {
            push_words(&mut body, f);
        }
        sections.push((56 + body.len() as u32, labels.len() as u32));
        for label in labels {
            let mut padded = [0u8; LABEL_SIZE];
            padded[..label.len()].copy_from_slice(label.as_bytes());
            body.extend_from_slice(&padded);
        }
        sections.push((56 + body.len() as u32, 0));
        sections.push((56 + body.len() as u32, field_indices.len() as u32 * 4));
        push_words(&mut body, field_indices);
        sections.push((56 + body.len() as u32, list_indices.len() as u32 * 4));
        push_words(&mut body, list_indices);

        let mut data = b"GFF V3.2".to_vec();
        for (offset, count) in sections {
            data.extend_from_slice(&offset.to_le_bytes());
            data.extend_from_slice(&count.to_le_bytes());
        }
        data.extend_from_slice(&body);
        data
    }

    /// `count` structs, each holding one Struct field that points at the next.
    fn chain(count: u32) -> Vec<u8> {
        let structs: Vec<[u32; 3]> = (0..count)
            .map(|i| if i + 1 < count { [i, i, 1] } else { [i, 0xFFFF_FFFF, 0] })
            .collect();
        let fields: Vec<[u32; 3]> = (0..count - 1).map(|i| [14, 0, i + 1]).collect();
        raw_gff(&structs, &fields, &["Next"], &[], &[])
    }

    #[test]
    fn test_self_referencing_struct_is_cycle() {
        // struct 0 -> field 0 (Struct, index 0)
        let data = raw_gff(&[[ROOT_STRUCT_TYPE, 0, 1]], &[[14, 0, 0]], &["Self"], &[], &[]);
        assert!(matches!(parse_gff_bytes(&data), Err(Error::GffStructCycle(0))));
    }

    #[test]
    fn test_struct_with_two_parents_is_rejected() {
        // Two Struct fields of the root both name struct 1.
        let data = raw_gff(
            &[[ROOT_STRUCT_TYPE, 0, 2], [7, 0xFFFF_FFFF, 0]],
            &[[14, 0, 1], [14, 1, 1]],
            &["First", "Second"],
            &[0, 1],
            &[],
        );
        let err = parse_gff_bytes(&data).unwrap_err();
        assert!(matches!(err, Error::GffStructShared(1)));
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn test_list_repeating_an_entry_is_rejected() {
        let data = raw_gff(
            &[[ROOT_STRUCT_TYPE, 0, 1], [7, 0xFFFF_FFFF, 0]],
            &[[15, 0, 0]],
            &["Items"],
            &[],
            &[2, 1, 1],
        );
        assert!(matches!(parse_gff_bytes(&data), Err(Error::GffStructShared(1))));
    }

    #[test]
    fn test_doubling_references_fail_fast() {
        // Struct i names struct i + 1 from two fields; decoding each copy would
        // take 2^count steps.
        let count = 26u32;
        let structs: Vec<[u32; 3]> = (0..count)
            .map(|i| if i + 1 < count { [i, i * 8, 2] } else { [i, 0xFFFF_FFFF, 0] })
            .collect();
        let fields: Vec<[u32; 3]> = (0..count - 1).flat_map(|i| [[14, 0, i + 1], [14, 1, i + 1]]).collect();
        let indices: Vec<u32> = (0..2 * (count - 1)).collect();
        let data = raw_gff(&structs, &fields, &["Left", "Right"], &indices, &[]);

        assert!(matches!(parse_gff_bytes(&data), Err(Error::GffStructShared(_))));
    }

    #[test]
    fn test_nesting_limit() {
        let deepest = MAX_NESTING_DEPTH as u32;
        let doc = parse_gff_bytes(&chain(deepest + 1)).unwrap();
        assert_eq!(doc.root.struct_count(), MAX_NESTING_DEPTH + 1);

        let err = parse_gff_bytes(&chain(deepest + 2)).unwrap_err();
        assert!(matches!(err, Error::GffNestingTooDeep { index, .. } if index == deepest + 1));
        assert_eq!(err.kind(), ErrorKind::MalformedInput);

        // Far past the limit still fails with an error rather than exhausting the stack.
        assert!(parse_gff_bytes(&chain(50_000)).is_err());
    }

    #[test]
    fn test_unterminated_label_stays_distinct_from_prefix() {
        let data = raw_gff(
            &[[ROOT_STRUCT_TYPE, 0, 2]],
            &[[0, 0, 1], [0, 1, 2]],
            &["LocalizedNameXYZ", "LocalizedName"],
            &[0, 1],
            &[],
        );
        let doc = parse_gff_bytes(&data).unwrap();
        assert_eq!(doc.root.get_u8("LocalizedNameXYZ"), Some(1));
        assert_eq!(doc.root.get_u8("LocalizedName"), Some(2));
    }

    #[test]
    fn test_decode_inline_sign() {
        assert_eq!(decode_inline(FieldType::Char, 0xFF), GffValue::Char(-1));
        assert_eq!(decode_inline(FieldType::Short, 0xFFFE), GffValue::Short(-2));
        assert_eq!(decode_inline(FieldType::Float, 1.5f32.to_bits()), GffValue::Float(1.5));
    }

    #[test]
    fn test_checked_range_overflow() {
        let section = [0u8; 8];
        assert!(matches!(
            checked_range(&section, "FieldData", u64::MAX, 2),
            Err(Error::OverflowDetected { .. })
        ));
        assert!(checked_range(&section, "FieldData", 4, 4).is_ok());
        assert!(checked_range(&section, "FieldData", 5, 4).is_err());
    }
}
