//! GFF ⇄ JSON conversion
//!
//! Fields become an object keyed by label, in file order, so two dumps
//! diff cleanly:
//!
//! ```json
//! {
//!   "fileType": "UTC",
//!   "version": "V3.2",
//!   "root": {
//!     "structType": 4294967295,
//!     "fields": {
//!       "Tag": { "type": "String", "value": "NW_CHICKEN" },
//!       "ItemList": { "type": "List", "value": [] }
//!     }
//!   }
//! }
//! ```

use std::fmt::Write as _;
use std::path::Path;

use serde_json::{Map, Value, json};

use crate::error::{Error, Result};
use crate::formats::gff::{GffDocument, GffField, GffStruct, GffValue, ROOT_STRUCT_TYPE, read_gff, write_gff};

/// Render a document as pretty-printed JSON.
///
/// # Errors
/// Returns [`Error::InvalidGffJson`] if a struct repeats a label, which an
/// object cannot represent.
pub fn gff_to_json(doc: &GffDocument) -> Result<String> {
    Ok(serde_json::to_string_pretty(&gff_to_value(doc)?)?)
}

/// # Errors
/// Returns [`Error::InvalidGffJson`] if a struct repeats a label.
pub fn gff_to_value(doc: &GffDocument) -> Result<Value> {
    Ok(json!({
        "fileType": doc.file_type_str(),
        "version": String::from_utf8_lossy(&doc.version),
        "root": struct_to_value(&doc.root)?,
    }))
}

fn struct_to_value(s: &GffStruct) -> Result<Value> {
    let mut fields = Map::with_capacity(s.fields.len());
    for field in &s.fields {
        let value = match &field.value {
            GffValue::Struct(child) => json!({ "type": "Struct", "value": struct_to_value(child)? }),
            GffValue::List(children) => {
                let entries = children.iter().map(struct_to_value).collect::<Result<Vec<_>>>()?;
                json!({ "type": "List", "value": entries })
            }
            GffValue::Void(bytes) => json!({ "type": "Void", "value": to_hex(bytes) }),
            other => serde_json::to_value(other)?,
        };
        if fields.insert(field.label.clone(), value).is_some() {
            return Err(Error::InvalidGffJson(format!("duplicate label {}", field.label)));
        }
    }
    Ok(json!({ "structType": s.struct_type, "fields": fields }))
}

/// Parse JSON produced by [`gff_to_json`].
///
/// # Errors
/// Returns [`Error::InvalidGffJson`] for anything that does not describe a
/// document, or [`Error::JsonError`] for malformed JSON.
pub fn json_to_gff(json: &str) -> Result<GffDocument> {
    value_to_gff(&serde_json::from_str(json)?)
}

/// # Errors
/// Returns [`Error::InvalidGffJson`] for anything that does not describe a
/// document.
pub fn value_to_gff(value: &Value) -> Result<GffDocument> {
    let file_type = value
        .get("fileType")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("missing fileType"))?;
    if file_type.len() > 4 {
        return Err(invalid(format!("fileType {file_type:?} is longer than 4 bytes")));
    }

    let mut doc = GffDocument::new(file_type);
    if let Some(version) = value.get("version").and_then(Value::as_str) {
        doc.version = version
            .as_bytes()
            .try_into()
            .map_err(|_| invalid(format!("version {version:?} is not 4 bytes")))?;
    }
    doc.root = value_to_struct(value.get("root").ok_or_else(|| invalid("missing root"))?)?;
    Ok(doc)
}

fn value_to_struct(value: &Value) -> Result<GffStruct> {
    let struct_type = match value.get("structType") {
        None => ROOT_STRUCT_TYPE,
        Some(t) => t
            .as_u64()
            .and_then(|t| u32::try_from(t).ok())
            .ok_or_else(|| invalid(format!("bad structType {t}")))?,
    };
    let mut s = GffStruct::new(struct_type);

    let Some(fields) = value.get("fields") else {
        return Ok(s);
    };
    let fields = fields.as_object().ok_or_else(|| invalid("fields must be an object"))?;
    for (label, typed) in fields {
        let kind = typed
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid(format!("{label}: missing type")))?;
        let inner = typed.get("value").unwrap_or(&Value::Null);
        let parsed = match kind {
            "Struct" => GffValue::Struct(value_to_struct(inner)?),
            "List" => GffValue::List(
                inner
                    .as_array()
                    .ok_or_else(|| invalid(format!("{label}: List value must be an array")))?
                    .iter()
                    .map(value_to_struct)
                    .collect::<Result<_>>()?,
            ),
            "Void" => GffValue::Void(from_hex(
                inner.as_str().ok_or_else(|| invalid(format!("{label}: Void value must be hex")))?,
            )?),
            _ => serde_json::from_value(typed.clone()).map_err(|e| invalid(format!("{label}: {e}")))?,
        };
        s.fields.push(GffField::new(label.clone(), parsed));
    }
    Ok(s)
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidGffJson(msg.into())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

fn from_hex(text: &str) -> Result<Vec<u8>> {
    if text.len() % 2 != 0 {
        return Err(invalid("odd-length hex string"));
    }
    (0..text.len())
        .step_by(2)
        .map(|i| {
            text.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| invalid(format!("bad hex at {i}")))
        })
        .collect()
}

/// Convert a GFF file to JSON.
///
/// # Errors
/// Returns an error if reading, conversion or writing fails.
pub fn convert_gff_to_json<P: AsRef<Path>>(source: P, dest: P) -> Result<()> {
    tracing::info!("Converting GFF→JSON: {:?} → {:?}", source.as_ref(), dest.as_ref());
    let doc = read_gff(&source)?;
    std::fs::write(dest, gff_to_json(&doc)?)?;
    Ok(())
}

/// Convert JSON produced by [`gff_to_json`] back to a GFF file.
///
/// # Errors
/// Returns an error if reading, conversion or writing fails.
pub fn convert_json_to_gff<P: AsRef<Path>>(source: P, dest: P) -> Result<()> {
    tracing::info!("Converting JSON→GFF: {:?} → {:?}", source.as_ref(), dest.as_ref());
    let doc = json_to_gff(&std::fs::read_to_string(&source)?)?;
    write_gff(&doc, dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::common::ResRef;
    use crate::formats::gff::{Gender, Language, LocString, serialize_gff};
    use pretty_assertions::assert_eq;

    fn sample() -> GffDocument {
        let mut doc = GffDocument::new("UTC");
        doc.root = GffStruct::new(ROOT_STRUCT_TYPE)
            .with("Tag", GffValue::String("NW_CHICKEN".into()))
            .with("TemplateResRef", GffValue::ResRef(ResRef::new("nw_chicken").unwrap()))
            .with("Race", GffValue::Byte(20))
            .with("Conversation", GffValue::Void(vec![0x00, 0xab, 0xff]))
            .with("FirstName", GffValue::LocString(LocString::with_text(Language::English, Gender::Masculine, "Chicken")))
            .with("Position", GffValue::Vector([1.5, -2.0, 0.25]))
            .with(
                "ItemList",
                GffValue::List(vec![GffStruct::new(0).with("InventoryRes", GffValue::ResRef(ResRef::new("it_a").unwrap()))]),
            )
            .with("Scripts", GffValue::Struct(GffStruct::new(7)));
        doc
    }

    #[test]
    fn test_json_roundtrip_is_byte_identical() {
        let doc = sample();
        let json = gff_to_json(&doc).unwrap();
        let back = json_to_gff(&json).unwrap();
        assert_eq!(back, doc);
        assert_eq!(serialize_gff(&back).unwrap(), serialize_gff(&doc).unwrap());
    }

    #[test]
    fn test_json_shape() {
        let value = gff_to_value(&sample()).unwrap();
        assert_eq!(value["fileType"], "UTC");
        assert_eq!(value["root"]["fields"]["Race"], json!({ "type": "Byte", "value": 20 }));
        assert_eq!(value["root"]["fields"]["Conversation"]["value"], "00abff");
        assert_eq!(value["root"]["fields"]["Scripts"]["value"]["structType"], 7);

        let labels: Vec<&String> = value["root"]["fields"].as_object().unwrap().keys().collect();
        assert_eq!(labels[0], "Tag");
        assert_eq!(labels[7], "Scripts");
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let mut doc = GffDocument::new("UTI");
        doc.root.fields.push(GffField::new("A", GffValue::Byte(1)));
        doc.root.fields.push(GffField::new("A", GffValue::Byte(2)));
        assert!(matches!(gff_to_json(&doc), Err(Error::InvalidGffJson(_))));
    }

    #[test]
    fn test_bad_input() {
        assert!(matches!(json_to_gff("{}"), Err(Error::InvalidGffJson(_))));
        assert!(matches!(json_to_gff("not json"), Err(Error::JsonError(_))));
        let bad_type = r#"{"fileType":"UTC","root":{"fields":{"X":{"type":"Nope","value":1}}}}"#;
        assert!(matches!(json_to_gff(bad_type), Err(Error::InvalidGffJson(_))));
    }
}
