//! Outer adapters: CSV input/output and human-readable formatting.

pub mod csv;
pub mod format;
