//! Route table builder.
//!
//! Retrieval and routing are split: [`NodeSnapshot::retrieve`] is the only
//! step that touches the content query boundary, and [`build_route_table`]
//! is a pure function of the snapshot and the frozen config.

use std::collections::HashSet;

use notegarden_shared::{
    ActiveSources, ContentNode, ContentQuery, ContentSourceConfig, NodeKind, PageRoute, Result,
};
use notegarden_sources::AdapterRegistry;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One listing per queried node kind, in the store's listing order.
#[derive(Debug, Clone, Default)]
pub struct NodeSnapshot {
    listings: Vec<(NodeKind, Vec<ContentNode>)>,
}

impl NodeSnapshot {
    /// Query the listing of every adapter whose source is active.
    ///
    /// Inactive kinds are never queried. The first failed query aborts.
    #[instrument(skip_all, fields(local = sources.local, remote = sources.remote))]
    pub async fn retrieve<Q: ContentQuery>(
        query: &Q,
        registry: &AdapterRegistry,
        sources: ActiveSources,
    ) -> Result<Self> {
        let mut snapshot = Self::default();
        for adapter in registry.active(sources) {
            let kind = adapter.kind();
            let nodes = query.list_nodes(kind).await?;
            debug!(%kind, count = nodes.len(), "listing retrieved");
            snapshot.listings.push((kind, nodes));
        }
        Ok(snapshot)
    }

    /// Nodes of `kind`, or an empty slice if that kind was not queried.
    pub fn listing(&self, kind: NodeKind) -> &[ContentNode] {
        self.listings
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, nodes)| nodes.as_slice())
            .unwrap_or_default()
    }

    /// Kinds that were queried, in query order.
    pub fn kinds(&self) -> impl Iterator<Item = NodeKind> + '_ {
        self.listings.iter().map(|(kind, _)| *kind)
    }

    pub fn node_count(&self) -> usize {
        self.listings.iter().map(|(_, nodes)| nodes.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Route table
// ---------------------------------------------------------------------------

/// Result of looking up the configured root note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum AliasOutcome {
    /// No root note configured.
    NotConfigured,
    /// The alias entry was appended for this node.
    Resolved { slug: String, context_id: String },
    /// A root note was configured but no route carries that slug.
    Missed { slug: String },
}

/// The ordered routes for one build, plus what was dropped on the way.
#[derive(Debug, Clone, Serialize)]
pub struct RouteTable {
    pub routes: Vec<PageRoute>,
    pub alias: AliasOutcome,
    /// Matching nodes that could not be slugged (e.g. blocks without a uid).
    pub excluded: usize,
    /// Routes dropped because an earlier route already claimed the path.
    pub duplicates: usize,
}

impl RouteTable {
    /// Number of non-alias routes bound to `kind`.
    pub fn count_by_kind(&self, kind: NodeKind) -> usize {
        self.routes
            .iter()
            .filter(|r| r.template_kind == kind && !r.is_alias)
            .count()
    }

    /// The synthetic root entry, if one was added.
    pub fn alias_route(&self) -> Option<&PageRoute> {
        self.routes.iter().find(|r| r.is_alias)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Build the route table from a retrieved snapshot.
///
/// Routes follow adapter order (local files, remote pages, remote blocks),
/// then listing order within each kind. A root alias, when resolved, is
/// always the last entry.
pub fn build_route_table(
    snapshot: &NodeSnapshot,
    config: &ContentSourceConfig,
    registry: &AdapterRegistry,
) -> RouteTable {
    let mut routes = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut excluded = 0;
    let mut duplicates = 0;

    for adapter in registry.active(config.active_sources()) {
        let before = routes.len();
        for node in snapshot.listing(adapter.kind()) {
            if !adapter.matches(node, config) {
                continue;
            }
            let Some(route) = adapter.to_route(node, config) else {
                excluded += 1;
                continue;
            };
            if !seen.insert(route.path.clone()) {
                warn!(
                    path = %route.path,
                    node = %node.id,
                    adapter = adapter.name(),
                    "duplicate route path, keeping first"
                );
                duplicates += 1;
                continue;
            }
            routes.push(route);
        }
        debug!(
            adapter = adapter.name(),
            routes = routes.len() - before,
            "adapter routed"
        );
    }

    let alias = resolve_alias(&mut routes, config);

    info!(
        routes = routes.len(),
        excluded, duplicates, "route table built"
    );

    RouteTable {
        routes,
        alias,
        excluded,
        duplicates,
    }
}

/// Retrieve a snapshot and build the route table in one step, without
/// touching any artifacts.
pub async fn compute_routes<Q: ContentQuery>(
    query: &Q,
    config: &ContentSourceConfig,
) -> Result<RouteTable> {
    let registry = AdapterRegistry::new();
    let snapshot = NodeSnapshot::retrieve(query, &registry, config.active_sources()).await?;
    Ok(build_route_table(&snapshot, config, &registry))
}

/// Append the root alias for the first route whose path equals the root note slug.
fn resolve_alias(routes: &mut Vec<PageRoute>, config: &ContentSourceConfig) -> AliasOutcome {
    let Some(slug) = config.root_note_slug() else {
        return AliasOutcome::NotConfigured;
    };

    match routes.iter().find(|r| r.path == slug) {
        Some(root) => {
            let alias = PageRoute {
                path: config.base_path().to_string(),
                template_kind: root.template_kind,
                context_id: root.context_id.clone(),
                is_alias: true,
            };
            let outcome = AliasOutcome::Resolved {
                slug: slug.to_string(),
                context_id: alias.context_id.clone(),
            };
            debug!(slug, path = %alias.path, "root alias added");
            routes.push(alias);
            outcome
        }
        None => {
            warn!(slug, "root note not found among routes, no alias created");
            AliasOutcome::Missed {
                slug: slug.to_string(),
            }
        }
    }
}
