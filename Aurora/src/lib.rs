//! # Aurora
//!
//! A pure-Rust library for Neverwinter Nights (Aurora engine) asset files.
//!
//! ## Supported Formats
//!
//! - **GFF** - Generic binary documents (UTC, UTI, DLG, IFO, ARE...), byte-exact round-trip
//! - **2DA** - Text rule tables
//! - **TLK** - Talk tables, with primary/custom StrRef routing
//! - **ERF/HAK/MOD** - Resource archives (read and write)
//! - **KEY/BIF** - Base game resource sets
//!
//! On top of the formats sit a layered [`resolver`] (module directory,
//! override, HAKs, base game) and a versioned on-disk [`cache`] for derived
//! lookups.
//!
//! ## Quick Start
//!
//! ### Reading a GFF document
//!
//! ```no_run
//! use aurora::formats::gff::{read_gff, write_gff};
//!
//! let mut doc = read_gff("nw_chicken.utc")?;
//! println!("Tag: {:?}", doc.root.get_string("Tag"));
//! doc.root.set("Tag", aurora::formats::GffValue::String("CHICKEN_2".into()));
//! write_gff(&doc, "nw_chicken2.utc")?;
//! # Ok::<(), aurora::Error>(())
//! ```
//!
//! ### Resolving a resource
//!
//! ```no_run
//! use aurora::prelude::*;
//!
//! let resolver = ResourceResolver::new(ResolverConfig::from_install_dir("/games/nwn"));
//! if let Some(found) = resolver.resolve("feat", ResourceType::TWODA) {
//!     let table = aurora::formats::twoda::parse_2da_bytes(&found.data)?;
//!     println!("{} feats from {}", table.row_count(), found.source);
//! }
//! # Ok::<(), aurora::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `aurora` command-line binary

pub mod archive;
pub mod cache;
pub mod converter;
pub mod error;
pub mod formats;
pub mod resolver;
pub mod utils;

// Re-exports for convenience
pub use error::{Error, ErrorKind, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::formats::common::{ResRef, ResourceKey, ResourceType};
    pub use crate::formats::gff::{GffDocument, GffField, GffStruct, GffValue, LocString};
    pub use crate::formats::tlk::{TalkTable, TalkTableSet, TlkEntry};
    pub use crate::formats::twoda::{Cell, TwoDaTable};

    // Containers
    pub use crate::archive::{
        ErfArchive, ErfType, ErfWriter, KeyBifContainer, KeyBifWriter, ResourceContainer, open_container,
    };

    // Resolution
    pub use crate::resolver::{
        ProbeStats, ResolvedResource, ResolverConfig, ResourceResolver, ResourceSource,
    };

    pub use crate::cache::{CacheLoad, CacheService, PathsSnapshot};
    pub use crate::converter;
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
