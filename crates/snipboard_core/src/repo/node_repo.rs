//! Snippet node repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist nodes with their document location and canvas position.
//! - Store a node together with its selection highlights atomically.
//!
//! # Invariants
//! - A node is only inserted into an existing project.
//! - Node listing is deterministic: `created_at ASC, rowid ASC`.
//! - Deleting a node cascades to its edges, comments and highlights.

use crate::model::annotation::{Comment, Highlight, NewHighlight};
use crate::model::ensure_not_blank;
use crate::model::geometry::Rect;
use crate::model::node::{CanvasPosition, NewNode, Node, NodeId, SourceLocation};
use crate::model::project::ProjectId;
use crate::repo::comment_repo::list_comments_for_project;
use crate::repo::highlight_repo::{
    insert_highlight, list_highlights_for_node, list_highlights_for_project,
};
use crate::repo::schema::{
    ensure_connection_ready, page_index_column, project_exists, touch_project,
    touch_project_of_node, uuid_column, COMMENTS, HIGHLIGHTS, NODES, PROJECTS,
};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

const NODE_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    content,
    zotero_item_key,
    source_document,
    page_index,
    rect_x,
    rect_y,
    rect_width,
    rect_height,
    position_x,
    position_y,
    created_at
FROM nodes";

/// Node plus the highlights stored with it.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeWithHighlights {
    pub node: Node,
    pub highlights: Vec<Highlight>,
}

/// Node with every annotation the canvas renders on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    #[serde(flatten)]
    pub node: Node,
    pub comments: Vec<Comment>,
    pub highlights: Vec<Highlight>,
}

/// Repository interface for snippet nodes.
pub trait NodeRepository {
    fn create_node(&self, node: &NewNode) -> RepoResult<Node>;
    /// Creates the node and one highlight per rect on the node's source page.
    fn create_node_with_highlights(
        &self,
        node: &NewNode,
        rects: &[Rect],
        color: Option<&str>,
    ) -> RepoResult<NodeWithHighlights>;
    fn get_node(&self, id: NodeId) -> RepoResult<Option<Node>>;
    /// Lists a project's nodes; fails with `NotFound` for an unknown project.
    fn list_nodes(&self, project_id: ProjectId) -> RepoResult<Vec<Node>>;
    /// Lists a project's nodes together with their comments and highlights.
    fn list_graph_nodes(&self, project_id: ProjectId) -> RepoResult<Vec<GraphNode>>;
    fn move_node(&self, id: NodeId, position: CanvasPosition) -> RepoResult<()>;
    fn update_content(&self, id: NodeId, content: &str) -> RepoResult<()>;
    fn delete_node(&self, id: NodeId) -> RepoResult<()>;
}

/// SQLite-backed node repository.
#[derive(Clone, Copy)]
pub struct SqliteNodeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNodeRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[PROJECTS, NODES, COMMENTS, HIGHLIGHTS])?;
        Ok(Self { conn })
    }
}

impl NodeRepository for SqliteNodeRepository<'_> {
    fn create_node(&self, node: &NewNode) -> RepoResult<Node> {
        Ok(self.create_node_with_highlights(node, &[], None)?.node)
    }

    fn create_node_with_highlights(
        &self,
        node: &NewNode,
        rects: &[Rect],
        color: Option<&str>,
    ) -> RepoResult<NodeWithHighlights> {
        node.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !project_exists(&tx, node.project_id)? {
            return Err(RepoError::not_found("project", node.project_id));
        }

        let id = Uuid::new_v4();
        insert_node(&tx, id, node)?;
        for rect in rects {
            let mut highlight = NewHighlight::new(
                id,
                node.source_document.clone(),
                node.location.page_index,
                *rect,
            );
            highlight.color = color.map(str::to_string);
            insert_highlight(&tx, &highlight)?;
        }
        touch_project(&tx, node.project_id)?;
        tx.commit()?;

        let stored = self
            .get_node(id)?
            .ok_or_else(|| RepoError::not_found("node", id))?;
        let highlights = list_highlights_for_node(self.conn, id)?;
        Ok(NodeWithHighlights {
            node: stored,
            highlights,
        })
    }

    fn get_node(&self, id: NodeId) -> RepoResult<Option<Node>> {
        self.conn
            .query_row(
                &format!("{NODE_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(parse_node_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_nodes(&self, project_id: ProjectId) -> RepoResult<Vec<Node>> {
        if !project_exists(self.conn, project_id)? {
            return Err(RepoError::not_found("project", project_id));
        }
        let mut stmt = self.conn.prepare(&format!(
            "{NODE_SELECT_SQL}
             WHERE project_id = ?1
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([project_id.to_string()])?;
        let mut nodes = Vec::new();
        while let Some(row) = rows.next()? {
            nodes.push(parse_node_row(row)?);
        }
        Ok(nodes)
    }

    fn list_graph_nodes(&self, project_id: ProjectId) -> RepoResult<Vec<GraphNode>> {
        let nodes = self.list_nodes(project_id)?;

        let mut comments: HashMap<NodeId, Vec<Comment>> = HashMap::new();
        for comment in list_comments_for_project(self.conn, project_id)? {
            comments.entry(comment.node_id).or_default().push(comment);
        }
        let mut highlights: HashMap<NodeId, Vec<Highlight>> = HashMap::new();
        for highlight in list_highlights_for_project(self.conn, project_id)? {
            highlights
                .entry(highlight.node_id)
                .or_default()
                .push(highlight);
        }

        Ok(nodes
            .into_iter()
            .map(|node| GraphNode {
                comments: comments.remove(&node.id).unwrap_or_default(),
                highlights: highlights.remove(&node.id).unwrap_or_default(),
                node,
            })
            .collect())
    }

    fn move_node(&self, id: NodeId, position: CanvasPosition) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE nodes
             SET position_x = ?2,
                 position_y = ?3
             WHERE id = ?1;",
            params![id.to_string(), position.x, position.y],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("node", id));
        }
        touch_project_of_node(self.conn, id)
    }

    fn update_content(&self, id: NodeId, content: &str) -> RepoResult<()> {
        ensure_not_blank(content, "node content")?;
        let changed = self.conn.execute(
            "UPDATE nodes SET content = ?2 WHERE id = ?1;",
            params![id.to_string(), content],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("node", id));
        }
        touch_project_of_node(self.conn, id)
    }

    fn delete_node(&self, id: NodeId) -> RepoResult<()> {
        let node = self
            .get_node(id)?
            .ok_or_else(|| RepoError::not_found("node", id))?;
        self.conn
            .execute("DELETE FROM nodes WHERE id = ?1;", [id.to_string()])?;
        touch_project(self.conn, node.project_id)?;
        Ok(())
    }
}

fn insert_node(conn: &Connection, id: NodeId, node: &NewNode) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO nodes (
            id,
            project_id,
            content,
            zotero_item_key,
            source_document,
            page_index,
            rect_x,
            rect_y,
            rect_width,
            rect_height,
            position_x,
            position_y
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
        params![
            id.to_string(),
            node.project_id.to_string(),
            node.content.as_str(),
            node.zotero_item_key.as_deref(),
            node.source_document.as_str(),
            node.location.page_index,
            node.location.rect.x,
            node.location.rect.y,
            node.location.rect.width,
            node.location.rect.height,
            node.position.x,
            node.position.y,
        ],
    )?;
    Ok(())
}

fn parse_node_row(row: &Row<'_>) -> RepoResult<Node> {
    Ok(Node {
        id: uuid_column(row, "id", "nodes.id")?,
        project_id: uuid_column(row, "project_id", "nodes.project_id")?,
        content: row.get("content")?,
        zotero_item_key: row.get("zotero_item_key")?,
        source_document: row.get("source_document")?,
        location: SourceLocation {
            page_index: page_index_column(row, "nodes.page_index")?,
            rect: Rect::new(
                row.get("rect_x")?,
                row.get("rect_y")?,
                row.get("rect_width")?,
                row.get("rect_height")?,
            ),
        },
        position: CanvasPosition::new(row.get("position_x")?, row.get("position_y")?),
        created_at: row.get("created_at")?,
    })
}
