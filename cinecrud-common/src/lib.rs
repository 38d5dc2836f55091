//! # cinecrud Common Library
//!
//! Shared code for the cinecrud catalog manager:
//! - Movie record model
//! - Key-value storage seam (in-memory and file-backed)
//! - Local snapshot store (init/work record sets per collection)
//! - Configuration loading
//! - Time helpers

pub mod config;
pub mod error;
pub mod kv;
pub mod models;
pub mod snapshot;
pub mod time;

pub use error::{Error, Result};
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use models::{Movie, Patch, PosterUrls, Record};
pub use snapshot::SnapshotStore;
