//! Common types and utilities shared across all Aurora formats

pub mod encoding;
pub mod resource_type;
pub mod resref;

pub use encoding::{decode_cp1252, encode_cp1252};
pub use resource_type::ResourceType;
pub use resref::{RESREF_MAX_LEN, RESREF_MAX_LEN_V11, ResRef, ResourceKey};
