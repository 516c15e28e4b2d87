//! Remote knowledge-graph page adapter.

use notegarden_shared::{ContentNode, ContentSourceConfig, NodeKind};

use super::{SourceAdapter, origin_matches};

/// Routes pages exported from the configured remote graph.
pub struct RemotePageAdapter;

impl SourceAdapter for RemotePageAdapter {
    fn kind(&self) -> NodeKind {
        NodeKind::RemotePage
    }

    fn matches(&self, node: &ContentNode, config: &ContentSourceConfig) -> bool {
        origin_matches(node, NodeKind::RemotePage, config.remote_graph_endpoint())
    }

    fn name(&self) -> &str {
        "remote-page"
    }
}
