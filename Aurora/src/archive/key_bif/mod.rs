//! KEY/BIF base-game resource sets
//!
//! A KEY file (`chitin.key`, `nwn_base.key`) lists BIF files and maps every
//! (resref, type) to a packed resource id: the BIF index in the top 12 bits
//! and the entry index inside that BIF in the low 20.

mod reader;
mod writer;

pub use reader::{BifFile, KeyBifContainer};
pub use writer::KeyBifWriter;

/// KEY header size.
pub const KEY_HEADER_SIZE: usize = 64;
/// KEY file table entry: size, name offset, name size, drives.
pub const KEY_FILE_ENTRY_SIZE: usize = 12;
/// KEY key table entry: resref, type, resource id.
pub const KEY_ENTRY_SIZE: usize = 22;
/// BIF header size.
pub const BIF_HEADER_SIZE: usize = 20;
/// BIF variable resource entry: id, offset, size, type.
pub const BIF_ENTRY_SIZE: usize = 16;

/// Bits of the resource id addressing the entry inside a BIF.
pub const RES_INDEX_BITS: u32 = 20;
const RES_INDEX_MASK: u32 = (1 << RES_INDEX_BITS) - 1;
/// Largest BIF index a resource id can hold.
pub const MAX_BIF_INDEX: u32 = (1 << (32 - RES_INDEX_BITS)) - 1;

/// Split a resource id into (bif index, entry index).
#[must_use]
pub fn split_res_id(res_id: u32) -> (u32, u32) {
    (res_id >> RES_INDEX_BITS, res_id & RES_INDEX_MASK)
}

/// Pack (bif index, entry index) into a resource id.
#[must_use]
pub fn pack_res_id(bif_index: u32, entry_index: u32) -> u32 {
    (bif_index << RES_INDEX_BITS) | (entry_index & RES_INDEX_MASK)
}
