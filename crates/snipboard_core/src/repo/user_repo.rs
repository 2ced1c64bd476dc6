//! User repository contract and SQLite implementation.
//!
//! # Invariants
//! - `zotero_id` lookups may return several accounts, oldest first.
//! - Deleting a user cascades to its projects through foreign keys.

use crate::model::user::{User, UserId};
use crate::repo::schema::{ensure_connection_ready, uuid_column, USERS};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const USER_SELECT_SQL: &str = "SELECT id, zotero_id, created_at FROM users";

/// Repository interface for user accounts.
pub trait UserRepository {
    fn create_user(&self, zotero_id: Option<&str>) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_by_zotero_id(&self, zotero_id: &str) -> RepoResult<Vec<User>>;
    fn delete_user(&self, id: UserId) -> RepoResult<()>;
}

/// SQLite-backed user repository.
#[derive(Clone, Copy)]
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[USERS])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, zotero_id: Option<&str>) -> RepoResult<User> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO users (id, zotero_id) VALUES (?1, ?2);",
            params![id.to_string(), zotero_id],
        )?;
        self.get_user(id)?
            .ok_or_else(|| RepoError::not_found("user", id))
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(parse_user_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn find_by_zotero_id(&self, zotero_id: &str) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL}
             WHERE zotero_id = ?1
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([zotero_id])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn delete_user(&self, id: UserId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found("user", id));
        }
        Ok(())
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        id: uuid_column(row, "id", "users.id")?,
        zotero_id: row.get("zotero_id")?,
        created_at: row.get("created_at")?,
    })
}
