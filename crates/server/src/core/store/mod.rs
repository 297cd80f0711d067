//! Document storage
//!
//! Each collection is a JSON array on disk, cached in memory and rewritten
//! atomically on every change.

pub mod json_store;

pub use json_store::JsonCollection;
