//! Source adapter trait and the three built-in adapters.
//!
//! Each adapter owns one [`NodeKind`]: it recognizes nodes that belong to the
//! configured source and turns them into page routes through the slug resolver.

mod local_file;
mod remote_block;
mod remote_page;

use notegarden_shared::{
    ActiveSources, ContentNode, ContentSourceConfig, NodeKind, PageRoute,
};
use tracing::debug;

pub use local_file::LocalFileAdapter;
pub use remote_block::RemoteBlockAdapter;
pub use remote_page::RemotePageAdapter;

use crate::slug;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Capability set shared by all content-source adapters.
pub trait SourceAdapter: Send + Sync {
    /// The node kind this adapter consumes (and the template it routes to).
    fn kind(&self) -> NodeKind;

    /// Whether `node` belongs to this adapter's configured source.
    fn matches(&self, node: &ContentNode, config: &ContentSourceConfig) -> bool;

    /// Human-readable adapter name for tracing.
    fn name(&self) -> &str;

    /// Map a matching node to its route. Invalid nodes are excluded, not fatal.
    fn to_route(&self, node: &ContentNode, config: &ContentSourceConfig) -> Option<PageRoute> {
        match slug::resolve(node, config) {
            Ok(path) => Some(PageRoute {
                path,
                template_kind: self.kind(),
                context_id: node.id.clone(),
                is_alias: false,
            }),
            Err(e) => {
                debug!(adapter = self.name(), node = %node.id, error = %e, "node excluded");
                None
            }
        }
    }
}

/// Compare a node's origin label against the configured one.
pub(crate) fn origin_matches(node: &ContentNode, kind: NodeKind, configured: Option<&str>) -> bool {
    node.kind == kind && configured.is_some_and(|origin| node.source_origin == origin)
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds the adapters in route-table order.
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn SourceAdapter>>,
}

impl AdapterRegistry {
    /// Create a registry with all built-in adapters: local files, remote pages, remote blocks.
    pub fn new() -> Self {
        Self {
            adapters: vec![
                Box::new(LocalFileAdapter),
                Box::new(RemotePageAdapter),
                Box::new(RemoteBlockAdapter),
            ],
        }
    }

    /// Adapters whose source is active, in registry order. Inactive adapters
    /// are never yielded, so they are never queried.
    pub fn active(&self, sources: ActiveSources) -> impl Iterator<Item = &dyn SourceAdapter> {
        self.adapters
            .iter()
            .filter(move |adapter| sources.includes_kind(adapter.kind()))
            .map(|adapter| adapter.as_ref())
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
