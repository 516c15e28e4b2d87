//! Local content directory adapter.

use notegarden_shared::{ContentNode, ContentSourceConfig, NodeKind};

use super::{SourceAdapter, origin_matches};

/// Routes files from the configured local content directory.
pub struct LocalFileAdapter;

impl SourceAdapter for LocalFileAdapter {
    fn kind(&self) -> NodeKind {
        NodeKind::LocalFile
    }

    fn matches(&self, node: &ContentNode, config: &ContentSourceConfig) -> bool {
        // Origin label is the content directory exactly as configured.
        origin_matches(node, NodeKind::LocalFile, config.local_content_dir())
    }

    fn name(&self) -> &str {
        "local-file"
    }
}
