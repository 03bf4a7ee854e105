//! Catalog sources: the built-in defaults and JSON files on disk.

pub mod builtin;
pub mod json_file;
