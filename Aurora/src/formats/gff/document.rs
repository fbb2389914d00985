//! GFF document tree: structs, labelled fields and typed values

use serde::{Deserialize, Serialize};

use super::FieldType;
use crate::formats::common::ResRef;

/// Struct type tag conventionally used for the top-level struct.
pub const ROOT_STRUCT_TYPE: u32 = 0xFFFF_FFFF;

/// A decoded GFF file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GffDocument {
    /// Four-character content tag, e.g. `UTC ` or `DLG `.
    pub file_type: [u8; 4],
    /// Four-character version tag, normally `V3.2`.
    pub version: [u8; 4],
    /// Struct 0.
    pub root: GffStruct,
}

impl GffDocument {
    /// Create an empty document with the given content tag (`"UTC"`, `"DLG "`...).
    ///
    /// Tags shorter than four characters are space-padded.
    #[must_use]
    pub fn new(file_type: &str) -> Self {
        let mut tag = *b"    ";
        for (slot, b) in tag.iter_mut().zip(file_type.bytes()) {
            *slot = b;
        }
        Self {
            file_type: tag,
            version: *super::GFF_VERSION,
            root: GffStruct::new(ROOT_STRUCT_TYPE),
        }
    }

    /// Content tag as text with trailing padding trimmed.
    #[must_use]
    pub fn file_type_str(&self) -> String {
        String::from_utf8_lossy(&self.file_type).trim_end().to_string()
    }
}

/// An ordered set of labelled fields plus a type discriminator.
///
/// Labels are not required to be unique by the format; lookups return
/// the first match, which is what every consumer expects.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GffStruct {
    pub struct_type: u32,
    pub fields: Vec<GffField>,
}

/// A single labelled value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GffField {
    pub label: String,
    pub value: GffValue,
}

impl GffField {
    #[must_use]
    pub fn new(label: impl Into<String>, value: GffValue) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum GffValue {
    Byte(u8),
    Char(i8),
    Word(u16),
    Short(i16),
    Dword(u32),
    Int(i32),
    Dword64(u64),
    Int64(i64),
    Float(f32),
    Double(f64),
    String(String),
    ResRef(ResRef),
    LocString(LocString),
    Void(Vec<u8>),
    Struct(GffStruct),
    List(Vec<GffStruct>),
    Orientation([f32; 4]),
    Vector([f32; 3]),
}

impl GffValue {
    /// On-disk type tag for this value.
    #[must_use]
    pub fn field_type(&self) -> FieldType {
        match self {
            GffValue::Byte(_) => FieldType::Byte,
            GffValue::Char(_) => FieldType::Char,
            GffValue::Word(_) => FieldType::Word,
            GffValue::Short(_) => FieldType::Short,
            GffValue::Dword(_) => FieldType::Dword,
            GffValue::Int(_) => FieldType::Int,
            GffValue::Dword64(_) => FieldType::Dword64,
            GffValue::Int64(_) => FieldType::Int64,
            GffValue::Float(_) => FieldType::Float,
            GffValue::Double(_) => FieldType::Double,
            GffValue::String(_) => FieldType::ExoString,
            GffValue::ResRef(_) => FieldType::ResRef,
            GffValue::LocString(_) => FieldType::ExoLocString,
            GffValue::Void(_) => FieldType::Void,
            GffValue::Struct(_) => FieldType::Struct,
            GffValue::List(_) => FieldType::List,
            GffValue::Orientation(_) => FieldType::Orientation,
            GffValue::Vector(_) => FieldType::Vector,
        }
    }
}

/// Localized string: an optional talk-table reference plus inline
/// per-language overrides.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LocString {
    /// StrRef into the talk table, [`LocString::NO_STRREF`] when unset.
    pub str_ref: u32,
    pub strings: Vec<LocSubString>,
}

impl LocString {
    pub const NO_STRREF: u32 = 0xFFFF_FFFF;

    /// A localized string with only a talk-table reference.
    #[must_use]
    pub fn from_strref(str_ref: u32) -> Self {
        Self {
            str_ref,
            strings: Vec::new(),
        }
    }

    /// A localized string with a single inline string.
    #[must_use]
    pub fn with_text(language: Language, gender: Gender, text: impl Into<String>) -> Self {
        Self {
            str_ref: Self::NO_STRREF,
            strings: vec![LocSubString::new(language, gender, text)],
        }
    }

    #[must_use]
    pub fn strref(&self) -> Option<u32> {
        (self.str_ref != Self::NO_STRREF).then_some(self.str_ref)
    }

    /// Inline text for a language/gender pair.
    #[must_use]
    pub fn text(&self, language: Language, gender: Gender) -> Option<&str> {
        let id = LocSubString::string_id(language, gender);
        self.strings
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.text.as_str())
    }

    /// Replace or add the inline text for a language/gender pair.
    pub fn set_text(&mut self, language: Language, gender: Gender, text: impl Into<String>) {
        let id = LocSubString::string_id(language, gender);
        let text = text.into();
        if let Some(existing) = self.strings.iter_mut().find(|s| s.id == id) {
            existing.text = text;
        } else {
            self.strings.push(LocSubString { id, text });
        }
    }
}

/// One inline string of a [`LocString`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocSubString {
    /// `language * 2 + gender`, kept raw so unknown languages round-trip.
    pub id: u32,
    pub text: String,
}

impl LocSubString {
    #[must_use]
    pub fn new(language: Language, gender: Gender, text: impl Into<String>) -> Self {
        Self {
            id: Self::string_id(language, gender),
            text: text.into(),
        }
    }

    #[must_use]
    pub fn string_id(language: Language, gender: Gender) -> u32 {
        u32::from(language as u8) * 2 + u32::from(gender as u8)
    }

    #[must_use]
    pub fn language(&self) -> Option<Language> {
        Language::from_id(self.id / 2)
    }

    #[must_use]
    pub fn gender(&self) -> Gender {
        if self.id % 2 == 0 {
            Gender::Masculine
        } else {
            Gender::Feminine
        }
    }
}

/// Languages with a talk table of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Language {
    English = 0,
    French = 1,
    German = 2,
    Italian = 3,
    Spanish = 4,
    Polish = 5,
    Korean = 128,
    ChineseTraditional = 129,
    ChineseSimplified = 130,
    Japanese = 131,
}

impl Language {
    #[must_use]
    pub fn from_id(id: u32) -> Option<Self> {
        Some(match id {
            0 => Self::English,
            1 => Self::French,
            2 => Self::German,
            3 => Self::Italian,
            4 => Self::Spanish,
            5 => Self::Polish,
            128 => Self::Korean,
            129 => Self::ChineseTraditional,
            130 => Self::ChineseSimplified,
            131 => Self::Japanese,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Gender {
    #[default]
    Masculine = 0,
    Feminine = 1,
}

// -----------------------------------------------------------------------------
// Field API
// -----------------------------------------------------------------------------

macro_rules! typed_getter {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $ty:ty) => {
        $(#[$doc])*
        #[must_use]
        pub fn $name(&self, label: &str) -> Option<$ty> {
            match self.field(label)? {
                GffValue::$variant(v) => Some(*v),
                _ => None,
            }
        }
    };
}

impl GffStruct {
    #[must_use]
    pub fn new(struct_type: u32) -> Self {
        Self {
            struct_type,
            fields: Vec::new(),
        }
    }

    /// Builder-style field append.
    #[must_use]
    pub fn with(mut self, label: impl Into<String>, value: GffValue) -> Self {
        self.fields.push(GffField::new(label, value));
        self
    }

    #[must_use]
    pub fn field(&self, label: &str) -> Option<&GffValue> {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| &f.value)
    }

    pub fn field_mut(&mut self, label: &str) -> Option<&mut GffValue> {
        self.fields
            .iter_mut()
            .find(|f| f.label == label)
            .map(|f| &mut f.value)
    }

    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.fields.iter().any(|f| f.label == label)
    }

    /// Replace the first field with this label, or append a new one.
    ///
    /// Returns the previous value when one was replaced.
    pub fn set(&mut self, label: &str, value: GffValue) -> Option<GffValue> {
        if let Some(slot) = self.field_mut(label) {
            return Some(std::mem::replace(slot, value));
        }
        self.fields.push(GffField::new(label, value));
        None
    }

    /// Remove the first field with this label.
    pub fn remove(&mut self, label: &str) -> Option<GffValue> {
        let pos = self.fields.iter().position(|f| f.label == label)?;
        Some(self.fields.remove(pos).value)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.label.as_str())
    }

    typed_getter!(get_u8, Byte, u8);
    typed_getter!(get_i8, Char, i8);
    typed_getter!(get_u16, Word, u16);
    typed_getter!(get_i16, Short, i16);
    typed_getter!(get_u32, Dword, u32);
    typed_getter!(get_i32, Int, i32);
    typed_getter!(get_u64, Dword64, u64);
    typed_getter!(get_i64, Int64, i64);
    typed_getter!(get_f32, Float, f32);
    typed_getter!(get_f64, Double, f64);

    /// Integer value of any integral field type, widened to `i64`.
    ///
    /// Typed models use this where the toolset itself is inconsistent about
    /// which width it writes for a field.
    #[must_use]
    pub fn get_integer(&self, label: &str) -> Option<i64> {
        Some(match self.field(label)? {
            GffValue::Byte(v) => i64::from(*v),
            GffValue::Char(v) => i64::from(*v),
            GffValue::Word(v) => i64::from(*v),
            GffValue::Short(v) => i64::from(*v),
            GffValue::Dword(v) => i64::from(*v),
            GffValue::Int(v) => i64::from(*v),
            GffValue::Int64(v) => *v,
            GffValue::Dword64(v) => i64::try_from(*v).ok()?,
            _ => return None,
        })
    }

    #[must_use]
    pub fn get_string(&self, label: &str) -> Option<&str> {
        match self.field(label)? {
            GffValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_resref(&self, label: &str) -> Option<&ResRef> {
        match self.field(label)? {
            GffValue::ResRef(r) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_locstring(&self, label: &str) -> Option<&LocString> {
        match self.field(label)? {
            GffValue::LocString(l) => Some(l),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_void(&self, label: &str) -> Option<&[u8]> {
        match self.field(label)? {
            GffValue::Void(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_struct(&self, label: &str) -> Option<&GffStruct> {
        match self.field(label)? {
            GffValue::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_struct_mut(&mut self, label: &str) -> Option<&mut GffStruct> {
        match self.field_mut(label)? {
            GffValue::Struct(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_list(&self, label: &str) -> Option<&[GffStruct]> {
        match self.field(label)? {
            GffValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn get_list_mut(&mut self, label: &str) -> Option<&mut Vec<GffStruct>> {
        match self.field_mut(label)? {
            GffValue::List(l) => Some(l),
            _ => None,
        }
    }

    /// Total number of structs in this subtree, including `self`.
    #[must_use]
    pub fn struct_count(&self) -> usize {
        1 + self
            .fields
            .iter()
            .map(|f| match &f.value {
                GffValue::Struct(s) => s.struct_count(),
                GffValue::List(items) => items.iter().map(GffStruct::struct_count).sum(),
                _ => 0,
            })
            .sum::<usize>()
    }
}
