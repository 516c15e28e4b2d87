//! Content sources: slug resolution and per-source adapters.
//!
//! This crate provides:
//! - [`slug`]: pure slug resolver (`resolve`, `slugify`, `url_join`)
//! - [`adapters`]: local-file, remote-page, and remote-block adapters
//! - [`AdapterRegistry`]: yields the adapters whose source is active

pub mod adapters;
pub mod slug;

pub use adapters::{
    AdapterRegistry, LocalFileAdapter, RemoteBlockAdapter, RemotePageAdapter, SourceAdapter,
};
pub use slug::{resolve, slugify, url_join};
