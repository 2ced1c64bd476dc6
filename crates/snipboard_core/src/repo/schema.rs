//! Connection readiness checks and row decoding helpers shared by repositories.

use crate::db::migrations::{current_user_version, latest_version};
use crate::model::node::NodeId;
use crate::model::project::ProjectId;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{Connection, Row};
use uuid::Uuid;

/// Table name plus the columns a repository reads or writes.
pub(crate) struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

pub(crate) const USERS: TableSpec = TableSpec {
    name: "users",
    columns: &["id", "zotero_id", "created_at"],
};

pub(crate) const PROJECTS: TableSpec = TableSpec {
    name: "projects",
    columns: &[
        "id",
        "user_id",
        "name",
        "created_at",
        "modified_at",
        "active_document",
    ],
};

pub(crate) const NODES: TableSpec = TableSpec {
    name: "nodes",
    columns: &[
        "id",
        "project_id",
        "content",
        "zotero_item_key",
        "source_document",
        "page_index",
        "rect_x",
        "rect_y",
        "rect_width",
        "rect_height",
        "position_x",
        "position_y",
        "created_at",
    ],
};

pub(crate) const EDGES: TableSpec = TableSpec {
    name: "edges",
    columns: &[
        "id",
        "project_id",
        "source_node_id",
        "target_node_id",
        "label",
        "edge_type",
    ],
};

pub(crate) const COMMENTS: TableSpec = TableSpec {
    name: "comments",
    columns: &["id", "node_id", "text", "created_at", "edited_at"],
};

pub(crate) const HIGHLIGHTS: TableSpec = TableSpec {
    name: "highlights",
    columns: &[
        "id",
        "node_id",
        "document_path",
        "page_index",
        "rect_x",
        "rect_y",
        "rect_width",
        "rect_height",
        "color",
    ],
};

/// Rejects connections that are not migrated or miss required tables/columns.
pub(crate) fn ensure_connection_ready(conn: &Connection, tables: &[TableSpec]) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in tables {
        if !table_exists(conn, table.name)? {
            return Err(RepoError::MissingRequiredTable(table.name));
        }
        for &column in table.columns {
            if !table_has_column(conn, table.name, column)? {
                return Err(RepoError::MissingRequiredColumn {
                    table: table.name,
                    column,
                });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn uuid_column(row: &Row<'_>, name: &str, column: &'static str) -> RepoResult<Uuid> {
    let value: String = row.get(name)?;
    parse_uuid(&value, column)
}

/// Reads a zero-based page index; negative or oversized values are invalid data.
pub(crate) fn page_index_column(row: &Row<'_>, column: &'static str) -> RepoResult<u32> {
    let value: i64 = row.get("page_index")?;
    u32::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid page index {value} in {column}")))
}

pub(crate) fn optional_uuid_column(
    row: &Row<'_>,
    name: &str,
    column: &'static str,
) -> RepoResult<Option<Uuid>> {
    row.get::<_, Option<String>>(name)?
        .map(|value| parse_uuid(&value, column))
        .transpose()
}

fn exists(conn: &Connection, sql: &str, id: Uuid) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(sql, [id.to_string()], |row| row.get(0))?;
    Ok(exists == 1)
}

pub(crate) fn project_exists(conn: &Connection, id: ProjectId) -> RepoResult<bool> {
    exists(conn, "SELECT EXISTS(SELECT 1 FROM projects WHERE id = ?1);", id)
}

pub(crate) fn node_exists(conn: &Connection, id: NodeId) -> RepoResult<bool> {
    exists(conn, "SELECT EXISTS(SELECT 1 FROM nodes WHERE id = ?1);", id)
}

/// Bumps `projects.modified_at` for one project.
pub(crate) fn touch_project(conn: &Connection, id: ProjectId) -> RepoResult<()> {
    conn.execute(
        "UPDATE projects
         SET modified_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1;",
        [id.to_string()],
    )?;
    Ok(())
}

/// Bumps `projects.modified_at` for the project owning `node_id`.
pub(crate) fn touch_project_of_node(conn: &Connection, node_id: NodeId) -> RepoResult<()> {
    conn.execute(
        "UPDATE projects
         SET modified_at = (strftime('%s', 'now') * 1000)
         WHERE id = (SELECT project_id FROM nodes WHERE id = ?1);",
        [node_id.to_string()],
    )?;
    Ok(())
}
