//! GFF file writing and serialization

use std::collections::HashMap;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use super::document::{GffDocument, GffStruct, GffValue, LocString};
use super::traversal::{DepthFirstEntryFirst, TraversalStrategy};
use super::types::{EMPTY_STRUCT_DATA, FieldStorage, HEADER_SIZE, LABEL_SIZE};
use crate::error::{Error, Result};
use crate::formats::common::encode_cp1252;

/// Write a GFF document to disk
///
/// # Errors
/// Returns an error if serialization fails or the file cannot be written.
pub fn write_gff<P: AsRef<Path>>(doc: &GffDocument, path: P) -> Result<()> {
    let bytes = serialize_gff(doc)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Serialize a GFF document using the legacy toolset layout
///
/// # Errors
/// Returns an error if a label or value does not fit the format.
pub fn serialize_gff(doc: &GffDocument) -> Result<Vec<u8>> {
    serialize_gff_with(doc, &DepthFirstEntryFirst)
}

/// Serialize a GFF document with an explicit struct numbering
///
/// # Errors
/// Returns an error if a label or value does not fit the format, or the
/// strategy does not number every struct exactly once.
pub fn serialize_gff_with<S: TraversalStrategy + ?Sized>(doc: &GffDocument, strategy: &S) -> Result<Vec<u8>> {
    let order = strategy.struct_order(&doc.root);
    let expected = doc.root.struct_count();

    let mut index_of: HashMap<*const GffStruct, u32> = HashMap::with_capacity(order.len());
    for (i, s) in order.iter().enumerate() {
        let i = u32::try_from(i).map_err(|_| Error::GffSectionTooLarge { section: "Structs" })?;
        index_of.insert(std::ptr::from_ref(*s), i);
    }
    let root_first = order.first().is_some_and(|s| std::ptr::eq(*s, &doc.root));
    if order.len() != expected || index_of.len() != expected || !root_first {
        return Err(Error::GffTraversal {
            numbered: index_of.len(),
            expected,
        });
    }

    let mut builder = SectionBuilder::default();
    for s in &order {
        builder.emit_struct(s, &index_of)?;
    }
    builder.finish(doc)
}

/// Accumulates the six sections while structs are emitted in order.
#[derive(Default)]
struct SectionBuilder {
    structs: Vec<u8>,
    fields: Vec<u8>,
    field_count: u32,
    labels: Vec<[u8; LABEL_SIZE]>,
    label_index: HashMap<String, u32>,
    field_data: Vec<u8>,
    field_indices: Vec<u8>,
    list_indices: Vec<u8>,
}

impl SectionBuilder {
    fn emit_struct(&mut self, s: &GffStruct, index_of: &HashMap<*const GffStruct, u32>) -> Result<()> {
        let mut field_ids = Vec::with_capacity(s.fields.len());
        for field in &s.fields {
            let label = self.intern_label(&field.label)?;
            let storage = self.emit_value(&field.label, &field.value, index_of)?;
            field_ids.push(self.field_count);
            self.fields.write_u32::<LittleEndian>(field.value.field_type().id())?;
            self.fields.write_u32::<LittleEndian>(label)?;
            self.fields.write_u32::<LittleEndian>(storage.raw())?;
            self.field_count = self
                .field_count
                .checked_add(1)
                .ok_or(Error::GffSectionTooLarge { section: "Fields" })?;
        }

        let data_or_offset = match field_ids.as_slice() {
            [] => EMPTY_STRUCT_DATA,
            [single] => *single,
            many => {
                let offset = section_offset(&self.field_indices, "FieldIndices")?;
                for id in many {
                    self.field_indices.write_u32::<LittleEndian>(*id)?;
                }
                offset
            }
        };

        self.structs.write_u32::<LittleEndian>(s.struct_type)?;
        self.structs.write_u32::<LittleEndian>(data_or_offset)?;
        self.structs.write_u32::<LittleEndian>(field_ids.len() as u32)?;
        Ok(())
    }

    /// Labels are shared across the file; only an exact match is reused.
    fn intern_label(&mut self, label: &str) -> Result<u32> {
        if let Some(&index) = self.label_index.get(label) {
            return Ok(index);
        }
        let bytes = encode_cp1252(label);
        if bytes.len() > LABEL_SIZE {
            return Err(Error::GffValueTooLarge {
                label: label.to_string(),
                reason: format!("label is {} bytes, limit {LABEL_SIZE}", bytes.len()),
            });
        }
        let mut slot = [0u8; LABEL_SIZE];
        slot[..bytes.len()].copy_from_slice(&bytes);

        let index = u32::try_from(self.labels.len()).map_err(|_| Error::GffSectionTooLarge { section: "Labels" })?;
        self.labels.push(slot);
        self.label_index.insert(label.to_string(), index);
        Ok(index)
    }

    fn emit_value(
        &mut self,
        label: &str,
        value: &GffValue,
        index_of: &HashMap<*const GffStruct, u32>,
    ) -> Result<FieldStorage> {
        let storage = match value {
            GffValue::Byte(v) => FieldStorage::Inline(u32::from(*v)),
            GffValue::Char(v) => FieldStorage::Inline(u32::from(*v as u8)),
            GffValue::Word(v) => FieldStorage::Inline(u32::from(*v)),
            GffValue::Short(v) => FieldStorage::Inline(u32::from(*v as u16)),
            GffValue::Dword(v) => FieldStorage::Inline(*v),
            GffValue::Int(v) => FieldStorage::Inline(*v as u32),
            GffValue::Float(v) => FieldStorage::Inline(v.to_bits()),

            GffValue::Struct(child) => FieldStorage::StructIndex(struct_index(child, index_of)?),
            GffValue::List(items) => {
                let offset = section_offset(&self.list_indices, "ListIndices")?;
                let count = u32::try_from(items.len()).map_err(|_| too_large(label, "list has too many entries"))?;
                self.list_indices.write_u32::<LittleEndian>(count)?;
                for item in items {
                    let index = struct_index(item, index_of)?;
                    self.list_indices.write_u32::<LittleEndian>(index)?;
                }
                FieldStorage::ListOffset(offset)
            }

            other => {
                let offset = section_offset(&self.field_data, "FieldData")?;
                self.write_field_data(label, other)?;
                FieldStorage::FieldData(offset)
            }
        };
        Ok(storage)
    }

    fn write_field_data(&mut self, label: &str, value: &GffValue) -> Result<()> {
        let out = &mut self.field_data;
        match value {
            GffValue::Dword64(v) => out.write_u64::<LittleEndian>(*v)?,
            GffValue::Int64(v) => out.write_i64::<LittleEndian>(*v)?,
            GffValue::Double(v) => out.write_f64::<LittleEndian>(*v)?,
            GffValue::String(s) => {
                let bytes = encode_cp1252(s);
                out.write_u32::<LittleEndian>(length_u32(label, bytes.len())?)?;
                out.extend_from_slice(&bytes);
            }
            GffValue::ResRef(r) => {
                let bytes = encode_cp1252(r.as_str());
                let len = u8::try_from(bytes.len()).map_err(|_| too_large(label, "resref exceeds 255 bytes"))?;
                out.push(len);
                out.extend_from_slice(&bytes);
            }
            GffValue::LocString(loc) => write_locstring(out, label, loc)?,
            GffValue::Void(bytes) => {
                out.write_u32::<LittleEndian>(length_u32(label, bytes.len())?)?;
                out.extend_from_slice(bytes);
            }
            GffValue::Orientation(q) => {
                for c in q {
                    out.write_f32::<LittleEndian>(*c)?;
                }
            }
            GffValue::Vector(v) => {
                for c in v {
                    out.write_f32::<LittleEndian>(*c)?;
                }
            }
            // Inline, struct and list values never reach the data section.
            _ => {}
        }
        Ok(())
    }

    fn finish(self, doc: &GffDocument) -> Result<Vec<u8>> {
        let labels_len = self.labels.len() * LABEL_SIZE;
        let total = HEADER_SIZE
            + self.structs.len()
            + self.fields.len()
            + labels_len
            + self.field_data.len()
            + self.field_indices.len()
            + self.list_indices.len();
        if u32::try_from(total).is_err() {
            return Err(Error::GffSectionTooLarge { section: "file" });
        }

        let mut output = Vec::with_capacity(total);
        output.extend_from_slice(&doc.file_type);
        output.extend_from_slice(&doc.version);

        // (offset, count) pairs; record counts for the first three sections,
        // byte counts for the last three.
        let mut offset = HEADER_SIZE;
        let sections = [
            (self.structs.len(), self.structs.len() / 12),
            (self.fields.len(), self.fields.len() / 12),
            (labels_len, self.labels.len()),
            (self.field_data.len(), self.field_data.len()),
            (self.field_indices.len(), self.field_indices.len()),
            (self.list_indices.len(), self.list_indices.len()),
        ];
        for (byte_len, count) in sections {
            output.write_u32::<LittleEndian>(offset as u32)?;
            output.write_u32::<LittleEndian>(count as u32)?;
            offset += byte_len;
        }

        output.extend_from_slice(&self.structs);
        output.extend_from_slice(&self.fields);
        for label in &self.labels {
            output.extend_from_slice(label);
        }
        output.extend_from_slice(&self.field_data);
        output.extend_from_slice(&self.field_indices);
        output.extend_from_slice(&self.list_indices);
        Ok(output)
    }
}

fn write_locstring(out: &mut Vec<u8>, label: &str, loc: &LocString) -> Result<()> {
    let encoded: Vec<(u32, Vec<u8>)> = loc
        .strings
        .iter()
        .map(|s| (s.id, encode_cp1252(&s.text)))
        .collect();

    // Size excludes the size field itself.
    let body: usize = 8 + encoded.iter().map(|(_, text)| 8 + text.len()).sum::<usize>();
    out.write_u32::<LittleEndian>(length_u32(label, body)?)?;
    out.write_u32::<LittleEndian>(loc.str_ref)?;
    out.write_u32::<LittleEndian>(length_u32(label, encoded.len())?)?;
    for (id, text) in &encoded {
        out.write_u32::<LittleEndian>(*id)?;
        out.write_u32::<LittleEndian>(text.len() as u32)?;
        out.extend_from_slice(text);
    }
    Ok(())
}

fn struct_index(child: &GffStruct, index_of: &HashMap<*const GffStruct, u32>) -> Result<u32> {
    index_of
        .get(&std::ptr::from_ref(child))
        .copied()
        .ok_or(Error::GffTraversal {
            numbered: index_of.len(),
            expected: index_of.len() + 1,
        })
}

fn section_offset(section: &[u8], name: &'static str) -> Result<u32> {
    u32::try_from(section.len()).map_err(|_| Error::GffSectionTooLarge { section: name })
}

fn length_u32(label: &str, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| too_large(label, "length exceeds 4 GiB"))
}

fn too_large(label: &str, reason: &str) -> Error {
    Error::GffValueTooLarge {
        label: label.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::gff::document::{Gender, Language};
    use crate::formats::gff::parse_gff_bytes;
    use crate::formats::gff::traversal::BreadthFirst;

    fn sample() -> GffDocument {
        let mut doc = GffDocument::new("UTI");
        doc.root = doc
            .root
            .with("TemplateResRef", GffValue::ResRef(crate::formats::common::ResRef::new("nw_it_gem001").unwrap()))
            .with(
                "LocalizedName",
                GffValue::LocString(LocString::with_text(Language::English, Gender::Masculine, "Gem")),
            )
            .with("Cost", GffValue::Dword(120))
            .with("Charges", GffValue::Byte(3))
            .with(
                "PropertiesList",
                GffValue::List(vec![
                    GffStruct::new(0).with("PropertyName", GffValue::Word(15)),
                    GffStruct::new(0),
                ]),
            );
        doc
    }

    #[test]
    fn test_header_layout() {
        let bytes = serialize_gff(&sample()).unwrap();
        assert_eq!(&bytes[0..8], b"UTI V3.2");
        // Structs start right after the header; root + two list entries.
        assert_eq!(u32::from_le_bytes(bytes[8..12].try_into().unwrap()), 56);
        assert_eq!(u32::from_le_bytes(bytes[12..16].try_into().unwrap()), 3);
        // Six fields, six distinct labels.
        assert_eq!(u32::from_le_bytes(bytes[20..24].try_into().unwrap()), 6);
        assert_eq!(u32::from_le_bytes(bytes[28..32].try_into().unwrap()), 6);
    }

    #[test]
    fn test_empty_struct_data_marker() {
        let bytes = serialize_gff(&sample()).unwrap();
        // Third struct record is the empty list entry.
        let record = 56 + 2 * 12;
        assert_eq!(u32::from_le_bytes(bytes[record + 4..record + 8].try_into().unwrap()), EMPTY_STRUCT_DATA);
        assert_eq!(u32::from_le_bytes(bytes[record + 8..record + 12].try_into().unwrap()), 0);
    }

    #[test]
    fn test_strategies_decode_alike() {
        let doc = sample();
        let dfs = serialize_gff(&doc).unwrap();
        let bfs = serialize_gff_with(&doc, &BreadthFirst).unwrap();
        assert_eq!(parse_gff_bytes(&dfs).unwrap(), doc);
        assert_eq!(parse_gff_bytes(&bfs).unwrap(), doc);
    }

    #[test]
    fn test_label_too_long() {
        let mut doc = GffDocument::new("GFF");
        doc.root.set("ThisLabelIsWayTooLong", GffValue::Byte(0));
        assert!(matches!(serialize_gff(&doc), Err(Error::GffValueTooLarge { .. })));
    }

    #[test]
    fn test_labels_shared() {
        let mut doc = GffDocument::new("GFF");
        doc.root = doc.root.with(
            "List",
            GffValue::List(vec![
                GffStruct::new(1).with("Value", GffValue::Int(1)),
                GffStruct::new(1).with("Value", GffValue::Int(2)),
            ]),
        );
        let bytes = serialize_gff(&doc).unwrap();
        assert_eq!(u32::from_le_bytes(bytes[28..32].try_into().unwrap()), 2);
    }

    struct SkipsChildren;

    impl TraversalStrategy for SkipsChildren {
        fn struct_order<'a>(&self, root: &'a GffStruct) -> Vec<&'a GffStruct> {
            vec![root]
        }
    }

    #[test]
    fn test_incomplete_strategy_rejected() {
        assert!(matches!(
            serialize_gff_with(&sample(), &SkipsChildren),
            Err(Error::GffTraversal { numbered: 1, expected: 3 })
        ));
    }
}
