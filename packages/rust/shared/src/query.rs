//! Content query boundary.
//!
//! The route table builder never enumerates content itself; it asks a
//! [`ContentQuery`] for one listing per node kind. A failed query is a
//! [`GardenError::Retrieval`], never an empty listing.

use crate::error::{GardenError, Result};
use crate::types::{ContentNode, NodeKind};

/// A data store that can list content nodes by kind.
#[allow(async_fn_in_trait)]
pub trait ContentQuery {
    /// All nodes of `kind`, in the store's listing order.
    async fn list_nodes(&self, kind: NodeKind) -> Result<Vec<ContentNode>>;
}

/// In-memory snapshot, listing order = insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshot {
    nodes: Vec<ContentNode>,
    failure: Option<String>,
}

impl MemorySnapshot {
    pub fn new(nodes: Vec<ContentNode>) -> Self {
        Self {
            nodes,
            failure: None,
        }
    }

    /// A snapshot whose every query fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            nodes: Vec::new(),
            failure: Some(message.into()),
        }
    }

    pub fn push(&mut self, node: ContentNode) {
        self.nodes.push(node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl ContentQuery for MemorySnapshot {
    async fn list_nodes(&self, kind: NodeKind) -> Result<Vec<ContentNode>> {
        if let Some(message) = &self.failure {
            return Err(GardenError::retrieval(message.clone()));
        }
        Ok(self
            .nodes
            .iter()
            .filter(|n| n.kind == kind)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_by_kind_in_insertion_order() {
        let snapshot = MemorySnapshot::new(vec![
            ContentNode::remote_page("p2", "g", "Second"),
            ContentNode::local_file("f1", "notes", "", "a"),
            ContentNode::remote_page("p1", "g", "First"),
        ]);

        let pages = snapshot.list_nodes(NodeKind::RemotePage).await.unwrap();
        let ids: Vec<&str> = pages.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["p2", "p1"]);
    }

    #[tokio::test]
    async fn failing_snapshot_reports_retrieval_error() {
        let snapshot = MemorySnapshot::failing("connection refused");
        let err = snapshot.list_nodes(NodeKind::LocalFile).await.unwrap_err();
        assert!(matches!(err, GardenError::Retrieval { .. }));
        assert!(err.to_string().contains("connection refused"));
    }
}
