//! Remote knowledge-graph export parser.
//!
//! The export is a JSON array of pages, each with a tree of blocks:
//!
//! ```json
//! [{ "title": "Page", "uid": "pg1", "children": [
//!     { "string": "block text", "uid": "b1", "children": [] }
//! ] }]
//! ```
//!
//! Pages become [`NodeKind::RemotePage`] nodes and every block, at any depth,
//! becomes a [`NodeKind::RemoteBlock`] node. Unknown fields are ignored.

use notegarden_shared::{ContentNode, GardenError, NodeKind, Result};
use serde::Deserialize;

use crate::stable_id;

// ---------------------------------------------------------------------------
// Export schema
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ExportPage {
    title: String,
    #[serde(default)]
    uid: Option<String>,
    #[serde(default)]
    children: Vec<ExportBlock>,
}

#[derive(Debug, Deserialize)]
struct ExportBlock {
    #[serde(default)]
    string: String,
    #[serde(default)]
    uid: Option<String>,
    #[serde(default)]
    children: Vec<ExportBlock>,
}

/// Nodes extracted from one export, in document order.
#[derive(Debug, Clone, Default)]
pub struct GraphExport {
    pub pages: Vec<ContentNode>,
    pub blocks: Vec<ContentNode>,
}

impl GraphExport {
    /// Nodes of one kind, for store replacement.
    pub fn nodes(&self, kind: NodeKind) -> &[ContentNode] {
        match kind {
            NodeKind::RemotePage => &self.pages,
            NodeKind::RemoteBlock => &self.blocks,
            NodeKind::LocalFile => &[],
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse an export, labeling every node with `origin`.
pub fn parse_graph_export(json: &str, origin: &str) -> Result<GraphExport> {
    let pages: Vec<ExportPage> = serde_json::from_str(json)
        .map_err(|e| GardenError::parse(format!("invalid graph export: {e}")))?;

    let mut export = GraphExport::default();

    for (page_index, page) in pages.iter().enumerate() {
        // Titles are not unique in exports; pages without a uid key on position.
        let page_key = match &page.uid {
            Some(uid) => format!("uid:{uid}"),
            None => format!("index:{page_index}"),
        };
        let page_id = stable_id("page", &[origin, &page_key]);

        let mut node = ContentNode::remote_page(&page_id, origin, &page.title);
        node.uid = page.uid.clone();
        export.pages.push(node);

        let mut position = vec![page_index];
        collect_blocks(&page.children, origin, &page_id, &mut position, &mut export.blocks);
    }

    Ok(export)
}

/// Depth-first walk; `position` is the index path used for ids of blocks
/// that have no uid.
fn collect_blocks(
    blocks: &[ExportBlock],
    origin: &str,
    page_id: &str,
    position: &mut Vec<usize>,
    out: &mut Vec<ContentNode>,
) {
    for (index, block) in blocks.iter().enumerate() {
        position.push(index);
        let path = position
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>()
            .join(".");
        let id = stable_id("block", &[origin, page_id, &path]);

        out.push(ContentNode::remote_block(
            id,
            origin,
            &block.string,
            block.uid.as_deref(),
        ));
        collect_blocks(&block.children, origin, page_id, position, out);
        position.pop();
    }
}
