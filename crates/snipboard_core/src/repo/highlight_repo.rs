//! Highlight repository contract and SQLite implementation.
//!
//! # Invariants
//! - One row stores one rectangle; batches are written in one transaction.
//! - Page listings are ordered by insertion (`rowid ASC`) so multi-line
//!   highlights come back in the order they were captured.

use crate::model::annotation::{Highlight, HighlightId, NewHighlight};
use crate::model::geometry::Rect;
use crate::model::node::NodeId;
use crate::model::project::ProjectId;
use crate::repo::schema::{
    ensure_connection_ready, node_exists, page_index_column, touch_project_of_node, uuid_column,
    HIGHLIGHTS, NODES, PROJECTS,
};
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::collections::BTreeSet;
use uuid::Uuid;

const HIGHLIGHT_SELECT_SQL: &str = "SELECT
    id,
    node_id,
    document_path,
    page_index,
    rect_x,
    rect_y,
    rect_width,
    rect_height,
    color
FROM highlights";

/// Repository interface for document highlights.
pub trait HighlightRepository {
    /// Inserts all drafts atomically and returns them in input order.
    fn create_highlights(&self, highlights: &[NewHighlight]) -> RepoResult<Vec<Highlight>>;
    fn get_highlight(&self, id: HighlightId) -> RepoResult<Option<Highlight>>;
    fn list_highlights_for_node(&self, node_id: NodeId) -> RepoResult<Vec<Highlight>>;
    fn list_highlights_for_page(
        &self,
        document_path: &str,
        page_index: u32,
    ) -> RepoResult<Vec<Highlight>>;
    fn delete_highlight(&self, id: HighlightId) -> RepoResult<()>;
}

/// SQLite-backed highlight repository.
#[derive(Clone, Copy)]
pub struct SqliteHighlightRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHighlightRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[PROJECTS, NODES, HIGHLIGHTS])?;
        Ok(Self { conn })
    }
}

impl HighlightRepository for SqliteHighlightRepository<'_> {
    fn create_highlights(&self, highlights: &[NewHighlight]) -> RepoResult<Vec<Highlight>> {
        for draft in highlights {
            draft.validate()?;
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut ids = Vec::with_capacity(highlights.len());
        let mut touched = BTreeSet::new();
        for draft in highlights {
            if !node_exists(&tx, draft.node_id)? {
                return Err(RepoError::not_found("node", draft.node_id));
            }
            ids.push(insert_highlight(&tx, draft)?);
            touched.insert(draft.node_id);
        }
        for node_id in touched {
            touch_project_of_node(&tx, node_id)?;
        }
        tx.commit()?;

        ids.into_iter()
            .map(|id| {
                self.get_highlight(id)?
                    .ok_or_else(|| RepoError::not_found("highlight", id))
            })
            .collect()
    }

    fn get_highlight(&self, id: HighlightId) -> RepoResult<Option<Highlight>> {
        self.conn
            .query_row(
                &format!("{HIGHLIGHT_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(parse_highlight_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_highlights_for_node(&self, node_id: NodeId) -> RepoResult<Vec<Highlight>> {
        list_highlights_for_node(self.conn, node_id)
    }

    fn list_highlights_for_page(
        &self,
        document_path: &str,
        page_index: u32,
    ) -> RepoResult<Vec<Highlight>> {
        query_highlights(
            self.conn,
            "WHERE document_path = ?1 AND page_index = ?2",
            vec![
                Value::Text(document_path.to_string()),
                Value::Integer(i64::from(page_index)),
            ],
        )
    }

    fn delete_highlight(&self, id: HighlightId) -> RepoResult<()> {
        let highlight = self
            .get_highlight(id)?
            .ok_or_else(|| RepoError::not_found("highlight", id))?;
        self.conn
            .execute("DELETE FROM highlights WHERE id = ?1;", [id.to_string()])?;
        touch_project_of_node(self.conn, highlight.node_id)?;
        Ok(())
    }
}

/// Inserts one highlight row without validation or project bookkeeping.
pub(crate) fn insert_highlight(conn: &Connection, draft: &NewHighlight) -> RepoResult<HighlightId> {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO highlights (
            id,
            node_id,
            document_path,
            page_index,
            rect_x,
            rect_y,
            rect_width,
            rect_height,
            color
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
        params![
            id.to_string(),
            draft.node_id.to_string(),
            draft.document_path.as_str(),
            draft.page_index,
            draft.rect.x,
            draft.rect.y,
            draft.rect.width,
            draft.rect.height,
            draft.color.as_deref(),
        ],
    )?;
    Ok(id)
}

pub(crate) fn list_highlights_for_node(
    conn: &Connection,
    node_id: NodeId,
) -> RepoResult<Vec<Highlight>> {
    query_highlights(
        conn,
        "WHERE node_id = ?1",
        vec![Value::Text(node_id.to_string())],
    )
}

/// Lists highlights of every node in one project, in insertion order.
pub(crate) fn list_highlights_for_project(
    conn: &Connection,
    project_id: ProjectId,
) -> RepoResult<Vec<Highlight>> {
    query_highlights(
        conn,
        "WHERE node_id IN (SELECT id FROM nodes WHERE project_id = ?1)",
        vec![Value::Text(project_id.to_string())],
    )
}

fn query_highlights(
    conn: &Connection,
    filter: &str,
    bind_values: Vec<Value>,
) -> RepoResult<Vec<Highlight>> {
    let mut stmt = conn.prepare(&format!(
        "{HIGHLIGHT_SELECT_SQL} {filter} ORDER BY rowid ASC;"
    ))?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut highlights = Vec::new();
    while let Some(row) = rows.next()? {
        highlights.push(parse_highlight_row(row)?);
    }
    Ok(highlights)
}

fn parse_highlight_row(row: &Row<'_>) -> RepoResult<Highlight> {
    Ok(Highlight {
        id: uuid_column(row, "id", "highlights.id")?,
        node_id: uuid_column(row, "node_id", "highlights.node_id")?,
        document_path: row.get("document_path")?,
        page_index: page_index_column(row, "highlights.page_index")?,
        rect: Rect::new(
            row.get("rect_x")?,
            row.get("rect_y")?,
            row.get("rect_width")?,
            row.get("rect_height")?,
        ),
        color: row.get("color")?,
    })
}
