//! Project repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist projects and their viewer state (`active_document`).
//! - Own `modified_at` bookkeeping for project-level writes.
//!
//! # Invariants
//! - Listing is deterministic: `modified_at DESC, rowid ASC`.
//! - Deleting a project cascades to nodes, edges and their annotations.

use crate::model::project::{Project, ProjectId};
use crate::model::user::UserId;
use crate::repo::schema::{
    ensure_connection_ready, optional_uuid_column, uuid_column, PROJECTS, USERS,
};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    name,
    created_at,
    modified_at,
    active_document
FROM projects";

/// Repository interface for projects.
pub trait ProjectRepository {
    /// Creates a project; `name` is stored as given.
    fn create_project(&self, user_id: Option<UserId>, name: &str) -> RepoResult<Project>;
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    /// Lists projects owned by one user, most recently modified first.
    fn list_projects(&self, user_id: UserId) -> RepoResult<Vec<Project>>;
    fn rename_project(&self, id: ProjectId, name: &str) -> RepoResult<()>;
    /// Records the document open in the viewer; `None` closes it.
    fn set_active_document(&self, id: ProjectId, path: Option<&str>) -> RepoResult<()>;
    fn delete_project(&self, id: ProjectId) -> RepoResult<()>;
}

/// SQLite-backed project repository.
#[derive(Clone, Copy)]
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[USERS, PROJECTS])?;
        Ok(Self { conn })
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(&self, user_id: Option<UserId>, name: &str) -> RepoResult<Project> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO projects (id, user_id, name) VALUES (?1, ?2, ?3);",
            params![id.to_string(), user_id.map(|value| value.to_string()), name],
        )?;
        self.get_project(id)?
            .ok_or_else(|| RepoError::not_found("project", id))
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        self.conn
            .query_row(
                &format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(parse_project_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_projects(&self, user_id: UserId) -> RepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY modified_at DESC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }

    fn rename_project(&self, id: ProjectId, name: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE projects
             SET name = ?2,
                 modified_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), name],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("project", id));
        }
        Ok(())
    }

    fn set_active_document(&self, id: ProjectId, path: Option<&str>) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE projects
             SET active_document = ?2,
                 modified_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), path],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("project", id));
        }
        Ok(())
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found("project", id));
        }
        Ok(())
    }
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    Ok(Project {
        id: uuid_column(row, "id", "projects.id")?,
        user_id: optional_uuid_column(row, "user_id", "projects.user_id")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
        modified_at: row.get("modified_at")?,
        active_document: row.get("active_document")?,
    })
}
