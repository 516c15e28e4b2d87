//! Shared types, error model, and configuration for notegarden.
//!
//! This crate is the foundation depended on by all other notegarden crates.
//! It provides:
//! - [`GardenError`]: the unified error type
//! - Domain types ([`ContentNode`], [`NodeKind`], [`PageRoute`], [`ActiveSources`])
//! - Configuration ([`GardenFile`], [`ContentSourceConfig`], config loading)
//! - The content query boundary ([`ContentQuery`], [`MemorySnapshot`])

pub mod config;
pub mod error;
pub mod query;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    BuildPathsConfig, ContentSourceConfig, GardenFile, GardenSection, config_dir,
    default_config_path, init_config, load_config, load_config_from,
};
pub use error::{GardenError, Result};
pub use query::{ContentQuery, MemorySnapshot};
pub use types::{ActiveSources, BuildId, ContentNode, NodeKind, PageRoute, RelativePath, SourceKind};
