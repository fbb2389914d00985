//! File format handlers for Aurora engine formats

pub mod common;
pub mod gff;
pub mod tlk;
pub mod twoda;

// Re-export common types for convenience
pub use common::{ResRef, ResourceKey, ResourceType};

// Re-export main document types
pub use gff::{GffDocument, GffField, GffStruct, GffValue, LocString, parse_gff_bytes, read_gff, serialize_gff, write_gff};
pub use tlk::{TalkTable, TalkTableSet, TlkEntry, read_tlk, write_tlk};
pub use twoda::{Cell, TwoDaTable, read_2da, write_2da};
