//! Remote knowledge-graph block adapter.

use notegarden_shared::{ContentNode, ContentSourceConfig, NodeKind};

use super::{SourceAdapter, origin_matches};

/// Routes individually addressable blocks from the configured remote graph.
///
/// Blocks without a uid match but resolve to no route.
pub struct RemoteBlockAdapter;

impl SourceAdapter for RemoteBlockAdapter {
    fn kind(&self) -> NodeKind {
        NodeKind::RemoteBlock
    }

    fn matches(&self, node: &ContentNode, config: &ContentSourceConfig) -> bool {
        origin_matches(node, NodeKind::RemoteBlock, config.remote_graph_endpoint())
    }

    fn name(&self) -> &str {
        "remote-block"
    }
}
