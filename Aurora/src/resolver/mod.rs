//! Layered resource resolution
//!
//! Resources are looked up in a fixed order: the module directory, the
//! override directory, each HAK in registration order, then each base
//! container in registration order. The first layer holding the
//! (name, type) pair wins.
//!
//! StrRefs resolve through the configured talk tables; values at or above
//! `0x01000000` address the module's custom table.

mod config;
mod layered;
mod module_info;
mod source;
mod strref;

// Public API
pub use config::ResolverConfig;
pub use module_info::{custom_tlk_from_ifo, hak_names_from_ifo};
pub use layered::{ProbeStats, ResourceResolver};
pub use source::{Layer, ResolvedResource, ResourceSource};
pub use strref::load_talk_tables;
