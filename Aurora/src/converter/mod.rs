//! Format conversion utilities
//!
//! - GFF (binary) ↔ JSON, for inspection and diffing

pub mod gff_json;

pub use gff_json::{
    convert_gff_to_json, convert_json_to_gff, gff_to_json, gff_to_value, json_to_gff, value_to_gff,
};
