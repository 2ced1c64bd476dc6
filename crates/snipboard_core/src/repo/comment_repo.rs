//! Comment repository contract and SQLite implementation.
//!
//! # Invariants
//! - `edited_at` is written only by `edit_comment`.
//! - Listing is chronological: `created_at ASC, rowid ASC`.

use crate::model::annotation::{validate_comment_text, Comment, CommentId};
use crate::model::node::NodeId;
use crate::model::project::ProjectId;
use crate::repo::schema::{
    ensure_connection_ready, node_exists, touch_project_of_node, uuid_column, COMMENTS, NODES,
    PROJECTS,
};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const COMMENT_SELECT_SQL: &str = "SELECT
    id,
    node_id,
    text,
    created_at,
    edited_at
FROM comments";

/// Repository interface for node comments.
pub trait CommentRepository {
    fn create_comment(&self, node_id: NodeId, text: &str) -> RepoResult<Comment>;
    fn get_comment(&self, id: CommentId) -> RepoResult<Option<Comment>>;
    fn list_comments(&self, node_id: NodeId) -> RepoResult<Vec<Comment>>;
    /// Replaces the text and stamps `edited_at`.
    fn edit_comment(&self, id: CommentId, text: &str) -> RepoResult<Comment>;
    fn delete_comment(&self, id: CommentId) -> RepoResult<()>;
}

/// SQLite-backed comment repository.
#[derive(Clone, Copy)]
pub struct SqliteCommentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommentRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[PROJECTS, NODES, COMMENTS])?;
        Ok(Self { conn })
    }
}

impl CommentRepository for SqliteCommentRepository<'_> {
    fn create_comment(&self, node_id: NodeId, text: &str) -> RepoResult<Comment> {
        validate_comment_text(text)?;
        if !node_exists(self.conn, node_id)? {
            return Err(RepoError::not_found("node", node_id));
        }

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO comments (id, node_id, text) VALUES (?1, ?2, ?3);",
            params![id.to_string(), node_id.to_string(), text],
        )?;
        touch_project_of_node(self.conn, node_id)?;

        self.get_comment(id)?
            .ok_or_else(|| RepoError::not_found("comment", id))
    }

    fn get_comment(&self, id: CommentId) -> RepoResult<Option<Comment>> {
        self.conn
            .query_row(
                &format!("{COMMENT_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(parse_comment_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_comments(&self, node_id: NodeId) -> RepoResult<Vec<Comment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMMENT_SELECT_SQL}
             WHERE node_id = ?1
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([node_id.to_string()])?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(parse_comment_row(row)?);
        }
        Ok(comments)
    }

    fn edit_comment(&self, id: CommentId, text: &str) -> RepoResult<Comment> {
        validate_comment_text(text)?;
        let changed = self.conn.execute(
            "UPDATE comments
             SET text = ?2,
                 edited_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), text],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("comment", id));
        }

        let comment = self
            .get_comment(id)?
            .ok_or_else(|| RepoError::not_found("comment", id))?;
        touch_project_of_node(self.conn, comment.node_id)?;
        Ok(comment)
    }

    fn delete_comment(&self, id: CommentId) -> RepoResult<()> {
        let comment = self
            .get_comment(id)?
            .ok_or_else(|| RepoError::not_found("comment", id))?;
        self.conn
            .execute("DELETE FROM comments WHERE id = ?1;", [id.to_string()])?;
        touch_project_of_node(self.conn, comment.node_id)?;
        Ok(())
    }
}

/// Lists comments of every node in one project, chronologically.
pub(crate) fn list_comments_for_project(
    conn: &Connection,
    project_id: ProjectId,
) -> RepoResult<Vec<Comment>> {
    let mut stmt = conn.prepare(&format!(
        "{COMMENT_SELECT_SQL}
         WHERE node_id IN (SELECT id FROM nodes WHERE project_id = ?1)
         ORDER BY created_at ASC, rowid ASC;"
    ))?;
    let mut rows = stmt.query([project_id.to_string()])?;
    let mut comments = Vec::new();
    while let Some(row) = rows.next()? {
        comments.push(parse_comment_row(row)?);
    }
    Ok(comments)
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<Comment> {
    Ok(Comment {
        id: uuid_column(row, "id", "comments.id")?,
        node_id: uuid_column(row, "node_id", "comments.node_id")?,
        text: row.get("text")?,
        created_at: row.get("created_at")?,
        edited_at: row.get("edited_at")?,
    })
}
