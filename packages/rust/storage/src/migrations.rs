//! SQL migration definitions for the node store.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: nodes",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per content node. `seq` preserves ingestion (listing) order.
CREATE TABLE IF NOT EXISTS nodes (
    seq           INTEGER PRIMARY KEY AUTOINCREMENT,
    id            TEXT NOT NULL UNIQUE,
    kind          TEXT NOT NULL,
    source_origin TEXT NOT NULL,
    title         TEXT NOT NULL,
    uid           TEXT,
    rel_dir       TEXT,
    rel_name      TEXT,
    ingested_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_nodes_kind ON nodes(kind);
CREATE INDEX IF NOT EXISTS idx_nodes_kind_origin ON nodes(kind, source_origin);

INSERT OR IGNORE INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
