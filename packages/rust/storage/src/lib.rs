//! libSQL node store (offline mode).
//!
//! The [`NodeStore`] holds the content-node snapshot written by ingestion and
//! read by the build. It implements [`ContentQuery`], so the build sees every
//! store failure as a retrieval error.
//!
//! **Access rules:**
//! - `notegarden ingest`: read-write via [`NodeStore::open`]
//! - `notegarden build` / `routes`: read-only via [`NodeStore::open_readonly`]

mod migrations;

use std::path::Path;

use chrono::Utc;
use libsql::{Connection, Database, params};
use notegarden_shared::{
    ContentNode, ContentQuery, GardenError, NodeKind, RelativePath, Result,
};

/// Primary storage handle wrapping a libSQL database.
pub struct NodeStore {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

/// Per kind and origin node count, for status output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginCount {
    pub kind: NodeKind,
    pub origin: String,
    pub count: u64,
}

impl NodeStore {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GardenError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| GardenError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| GardenError::Storage(e.to_string()))?;

        let store = Self {
            db,
            conn,
            readonly: false,
        };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Open an existing database at `path` in read-only mode.
    ///
    /// A missing file is a retrieval error: building from a store that was
    /// never ingested would silently produce an empty site.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GardenError::retrieval(format!(
                "node store not found at {} (run `notegarden ingest` first)",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| GardenError::retrieval(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| GardenError::retrieval(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        GardenError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(GardenError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Node operations
    // -----------------------------------------------------------------------

    /// Replace every node of `kind` from `origin` with `nodes`, atomically.
    ///
    /// Re-ingesting the same source is idempotent; nodes of other origins are
    /// left alone (the build filters them out by origin).
    pub async fn replace_nodes(
        &self,
        kind: NodeKind,
        origin: &str,
        nodes: &[ContentNode],
    ) -> Result<usize> {
        self.check_writable()?;

        if let Some(node) = nodes.iter().find(|n| n.kind != kind || n.source_origin != origin) {
            return Err(GardenError::validation(format!(
                "node {} ({}, {}) does not belong to {kind} from {origin}",
                node.id, node.kind, node.source_origin
            )));
        }

        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| GardenError::Storage(e.to_string()))?;

        tx.execute(
            "DELETE FROM nodes WHERE kind = ?1 AND source_origin = ?2",
            params![kind.as_str(), origin],
        )
        .await
        .map_err(|e| GardenError::Storage(e.to_string()))?;

        let now = Utc::now().to_rfc3339();
        for node in nodes {
            let (rel_dir, rel_name) = match &node.relative_path {
                Some(p) => (Some(p.dir.as_str()), Some(p.name.as_str())),
                None => (None, None),
            };
            tx.execute(
                "INSERT INTO nodes (id, kind, source_origin, title, uid, rel_dir, rel_name, ingested_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    node.id.as_str(),
                    kind.as_str(),
                    origin,
                    node.title.as_str(),
                    node.uid.as_deref(),
                    rel_dir,
                    rel_name,
                    now.as_str(),
                ],
            )
            .await
            .map_err(|e| GardenError::Storage(format!("insert node {}: {e}", node.id)))?;
        }

        tx.commit()
            .await
            .map_err(|e| GardenError::Storage(e.to_string()))?;

        tracing::debug!(%kind, origin, count = nodes.len(), "nodes replaced");
        Ok(nodes.len())
    }

    /// List all nodes of `kind` in ingestion order.
    pub async fn list_by_kind(&self, kind: NodeKind) -> Result<Vec<ContentNode>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, kind, source_origin, title, uid, rel_dir, rel_name
                 FROM nodes WHERE kind = ?1 ORDER BY seq",
                params![kind.as_str()],
            )
            .await
            .map_err(|e| GardenError::retrieval(e.to_string()))?;

        let mut results = Vec::new();
        loop {
            match rows.next().await {
                Ok(Some(row)) => results.push(row_to_node(&row)?),
                Ok(None) => break,
                Err(e) => return Err(GardenError::retrieval(e.to_string())),
            }
        }
        Ok(results)
    }

    /// Node counts grouped by kind and origin.
    pub async fn origin_counts(&self) -> Result<Vec<OriginCount>> {
        let mut rows = self
            .conn
            .query(
                "SELECT kind, source_origin, COUNT(*) FROM nodes
                 GROUP BY kind, source_origin ORDER BY kind, source_origin",
                params![],
            )
            .await
            .map_err(|e| GardenError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let kind: String = row
                .get(0)
                .map_err(|e| GardenError::Storage(e.to_string()))?;
            results.push(OriginCount {
                kind: kind.parse().map_err(GardenError::Storage)?,
                origin: row
                    .get::<String>(1)
                    .map_err(|e| GardenError::Storage(e.to_string()))?,
                count: row
                    .get::<i64>(2)
                    .map_err(|e| GardenError::Storage(e.to_string()))? as u64,
            });
        }
        Ok(results)
    }
}

impl ContentQuery for NodeStore {
    async fn list_nodes(&self, kind: NodeKind) -> Result<Vec<ContentNode>> {
        self.list_by_kind(kind).await
    }
}

/// Convert a row to a node. Malformed rows are retrieval errors.
fn row_to_node(row: &libsql::Row) -> Result<ContentNode> {
    let kind: String = row
        .get(1)
        .map_err(|e| GardenError::retrieval(e.to_string()))?;
    let kind: NodeKind = kind.parse().map_err(GardenError::retrieval)?;

    let relative_path = match (row.get::<String>(5).ok(), row.get::<String>(6).ok()) {
        (Some(dir), Some(name)) => Some(RelativePath { dir, name }),
        _ => None,
    };

    Ok(ContentNode {
        id: row
            .get::<String>(0)
            .map_err(|e| GardenError::retrieval(e.to_string()))?,
        kind,
        source_origin: row
            .get::<String>(2)
            .map_err(|e| GardenError::retrieval(e.to_string()))?,
        title: row
            .get::<String>(3)
            .map_err(|e| GardenError::retrieval(e.to_string()))?,
        uid: row.get::<String>(4).ok(),
        relative_path,
    })
}
