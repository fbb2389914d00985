//! Utility functions

pub mod path;

pub use path::{find_case_insensitive, normalize_path, resolve_relative_path};
