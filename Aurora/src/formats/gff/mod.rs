//! GFF (Generic File Format) V3.2 binary codec
//!
//! GFF is the structured container behind most Aurora blueprints (`.utc`,
//! `.uti`, `.dlg`, `.ifo`, `.are`, ...). A file is a tree of structs whose
//! fields carry typed values, nested structs or lists of structs.
//!
//! [`serialize_gff`] reproduces the legacy toolset layout, so a file read with
//! [`parse_gff_bytes`] writes back byte-for-byte.

mod document;
mod reader;
mod traversal;
mod types;
mod writer;

// Public API
pub use document::{
    Gender, GffDocument, GffField, GffStruct, GffValue, Language, LocString, LocSubString,
    ROOT_STRUCT_TYPE,
};
pub use reader::{MAX_NESTING_DEPTH, parse_gff_bytes, read_gff};
pub use traversal::{BreadthFirst, DepthFirstEntryFirst, TraversalStrategy};
pub use types::{FieldStorage, FieldType, GFF_VERSION};
pub use writer::{serialize_gff, serialize_gff_with, write_gff};
