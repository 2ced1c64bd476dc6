//! Edge repository contract and SQLite implementation.
//!
//! # Invariants
//! - Endpoint project membership is checked by the graph service, not here.
//! - Edge listing is deterministic: `rowid ASC` (creation order).

use crate::model::edge::{Edge, EdgeId, NewEdge};
use crate::model::ensure_not_blank;
use crate::model::node::NodeId;
use crate::model::project::ProjectId;
use crate::repo::schema::{
    ensure_connection_ready, project_exists, touch_project, uuid_column, EDGES, NODES, PROJECTS,
};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const EDGE_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    source_node_id,
    target_node_id,
    label,
    edge_type
FROM edges";

/// Repository interface for edges.
pub trait EdgeRepository {
    fn create_edge(&self, edge: &NewEdge) -> RepoResult<Edge>;
    fn get_edge(&self, id: EdgeId) -> RepoResult<Option<Edge>>;
    fn list_edges(&self, project_id: ProjectId) -> RepoResult<Vec<Edge>>;
    /// Lists edges where the node is either source or target.
    fn list_edges_for_node(&self, node_id: NodeId) -> RepoResult<Vec<Edge>>;
    fn update_edge(&self, id: EdgeId, label: Option<&str>, edge_type: &str) -> RepoResult<()>;
    fn delete_edge(&self, id: EdgeId) -> RepoResult<()>;
}

/// SQLite-backed edge repository.
#[derive(Clone, Copy)]
pub struct SqliteEdgeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEdgeRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[PROJECTS, NODES, EDGES])?;
        Ok(Self { conn })
    }
}

impl EdgeRepository for SqliteEdgeRepository<'_> {
    fn create_edge(&self, edge: &NewEdge) -> RepoResult<Edge> {
        edge.validate()?;
        if !project_exists(self.conn, edge.project_id)? {
            return Err(RepoError::not_found("project", edge.project_id));
        }

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO edges (
                id,
                project_id,
                source_node_id,
                target_node_id,
                label,
                edge_type
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id.to_string(),
                edge.project_id.to_string(),
                edge.source_node_id.to_string(),
                edge.target_node_id.to_string(),
                edge.label.as_deref(),
                edge.edge_type.as_str(),
            ],
        )?;
        touch_project(self.conn, edge.project_id)?;

        self.get_edge(id)?
            .ok_or_else(|| RepoError::not_found("edge", id))
    }

    fn get_edge(&self, id: EdgeId) -> RepoResult<Option<Edge>> {
        self.conn
            .query_row(
                &format!("{EDGE_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(parse_edge_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_edges(&self, project_id: ProjectId) -> RepoResult<Vec<Edge>> {
        query_edges(
            self.conn,
            &format!("{EDGE_SELECT_SQL} WHERE project_id = ?1 ORDER BY rowid ASC;"),
            project_id,
        )
    }

    fn list_edges_for_node(&self, node_id: NodeId) -> RepoResult<Vec<Edge>> {
        query_edges(
            self.conn,
            &format!(
                "{EDGE_SELECT_SQL}
                 WHERE source_node_id = ?1 OR target_node_id = ?1
                 ORDER BY rowid ASC;"
            ),
            node_id,
        )
    }

    fn update_edge(&self, id: EdgeId, label: Option<&str>, edge_type: &str) -> RepoResult<()> {
        ensure_not_blank(edge_type, "edge type")?;
        let edge = self
            .get_edge(id)?
            .ok_or_else(|| RepoError::not_found("edge", id))?;
        self.conn.execute(
            "UPDATE edges SET label = ?2, edge_type = ?3 WHERE id = ?1;",
            params![id.to_string(), label, edge_type],
        )?;
        touch_project(self.conn, edge.project_id)?;
        Ok(())
    }

    fn delete_edge(&self, id: EdgeId) -> RepoResult<()> {
        let edge = self
            .get_edge(id)?
            .ok_or_else(|| RepoError::not_found("edge", id))?;
        self.conn
            .execute("DELETE FROM edges WHERE id = ?1;", [id.to_string()])?;
        touch_project(self.conn, edge.project_id)?;
        Ok(())
    }
}

fn query_edges(conn: &Connection, sql: &str, id: Uuid) -> RepoResult<Vec<Edge>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut edges = Vec::new();
    while let Some(row) = rows.next()? {
        edges.push(parse_edge_row(row)?);
    }
    Ok(edges)
}

fn parse_edge_row(row: &Row<'_>) -> RepoResult<Edge> {
    Ok(Edge {
        id: uuid_column(row, "id", "edges.id")?,
        project_id: uuid_column(row, "project_id", "edges.project_id")?,
        source_node_id: uuid_column(row, "source_node_id", "edges.source_node_id")?,
        target_node_id: uuid_column(row, "target_node_id", "edges.target_node_id")?,
        label: row.get("label")?,
        edge_type: row.get("edge_type")?,
    })
}
