//! Schema-integrity report over a whole database.
//!
//! # Responsibility
//! - Detect rows breaking the graph's referential rules, including the
//!   same-project rule for edges that foreign keys cannot express.
//! - Surface SQLite's own `foreign_key_check` findings.
//!
//! # Invariants
//! - Read-only: never repairs or deletes data.
//! - Every id list is ordered by `rowid ASC`.

use crate::model::annotation::{CommentId, HighlightId};
use crate::model::edge::EdgeId;
use crate::model::node::NodeId;
use crate::repo::{parse_uuid, RepoResult};
use log::{info, warn};
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

const ORPHAN_NODES_SQL: &str = "SELECT n.id
FROM nodes n
LEFT JOIN projects p ON p.id = n.project_id
WHERE p.id IS NULL
ORDER BY n.rowid ASC;";

const DANGLING_EDGES_SQL: &str = "SELECT e.id
FROM edges e
LEFT JOIN nodes s ON s.id = e.source_node_id
LEFT JOIN nodes t ON t.id = e.target_node_id
WHERE s.id IS NULL OR t.id IS NULL
ORDER BY e.rowid ASC;";

const CROSS_PROJECT_EDGES_SQL: &str = "SELECT e.id
FROM edges e
INNER JOIN nodes s ON s.id = e.source_node_id
INNER JOIN nodes t ON t.id = e.target_node_id
WHERE s.project_id <> e.project_id
   OR t.project_id <> e.project_id
ORDER BY e.rowid ASC;";

const ORPHAN_COMMENTS_SQL: &str = "SELECT c.id
FROM comments c
LEFT JOIN nodes n ON n.id = c.node_id
WHERE n.id IS NULL
ORDER BY c.rowid ASC;";

const ORPHAN_HIGHLIGHTS_SQL: &str = "SELECT h.id
FROM highlights h
LEFT JOIN nodes n ON n.id = h.node_id
WHERE n.id IS NULL
ORDER BY h.rowid ASC;";

/// One row reported by `PRAGMA foreign_key_check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyViolation {
    pub table: String,
    pub rowid: Option<i64>,
    pub parent: String,
}

/// Integrity findings. Empty lists mean the rule holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    /// Nodes whose project does not exist.
    pub orphan_nodes: Vec<NodeId>,
    /// Edges with a missing source or target node.
    pub dangling_edges: Vec<EdgeId>,
    /// Edges with an endpoint in another project.
    pub cross_project_edges: Vec<EdgeId>,
    pub orphan_comments: Vec<CommentId>,
    pub orphan_highlights: Vec<HighlightId>,
    pub foreign_key_violations: Vec<ForeignKeyViolation>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.violation_count() == 0
    }

    pub fn violation_count(&self) -> usize {
        self.orphan_nodes.len()
            + self.dangling_edges.len()
            + self.cross_project_edges.len()
            + self.orphan_comments.len()
            + self.orphan_highlights.len()
            + self.foreign_key_violations.len()
    }
}

/// Scans the database for referential-integrity violations.
pub fn check_integrity(conn: &Connection) -> RepoResult<IntegrityReport> {
    let report = IntegrityReport {
        orphan_nodes: select_ids(conn, ORPHAN_NODES_SQL, "nodes.id")?,
        dangling_edges: select_ids(conn, DANGLING_EDGES_SQL, "edges.id")?,
        cross_project_edges: select_ids(conn, CROSS_PROJECT_EDGES_SQL, "edges.id")?,
        orphan_comments: select_ids(conn, ORPHAN_COMMENTS_SQL, "comments.id")?,
        orphan_highlights: select_ids(conn, ORPHAN_HIGHLIGHTS_SQL, "highlights.id")?,
        foreign_key_violations: foreign_key_violations(conn)?,
    };

    if report.is_clean() {
        info!("event=integrity_check module=integrity status=ok violations=0");
    } else {
        warn!(
            "event=integrity_check module=integrity status=violations violations={} orphan_nodes={} dangling_edges={} cross_project_edges={}",
            report.violation_count(),
            report.orphan_nodes.len(),
            report.dangling_edges.len(),
            report.cross_project_edges.len()
        );
    }
    Ok(report)
}

fn select_ids(conn: &Connection, sql: &str, column: &'static str) -> RepoResult<Vec<Uuid>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, column)?);
    }
    Ok(ids)
}

fn foreign_key_violations(conn: &Connection) -> RepoResult<Vec<ForeignKeyViolation>> {
    let mut stmt = conn.prepare("PRAGMA foreign_key_check;")?;
    let mut rows = stmt.query([])?;
    let mut violations = Vec::new();
    while let Some(row) = rows.next()? {
        violations.push(ForeignKeyViolation {
            table: row.get(0)?,
            rowid: row.get(1)?,
            parent: row.get(2)?,
        });
    }
    Ok(violations)
}
