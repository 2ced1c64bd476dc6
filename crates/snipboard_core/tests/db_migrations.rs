use rusqlite::Connection;
use snipboard_core::db::migrations::{current_user_version, latest_version};
use snipboard_core::db::{open_db, open_db_in_memory, DbError};

const TABLES: [&str; 6] = ["users", "projects", "nodes", "edges", "comments", "highlights"];

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
    for table in TABLES {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn connections_enforce_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let err = conn
        .execute(
            "INSERT INTO nodes (id, project_id, content, source_document)
             VALUES ('n1', 'missing-project', 'text', 'paper.pdf');",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("FOREIGN KEY"));
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snipboard.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute("INSERT INTO users (id) VALUES ('u1');", [])
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(current_user_version(&conn_second).unwrap(), latest_version());
    let users: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(users, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn column_defaults_match_canvas_expectations() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO projects (id) VALUES ('p1');
         INSERT INTO nodes (id, project_id, content, source_document)
         VALUES ('n1', 'p1', 'text', 'paper.pdf');
         INSERT INTO edges (id, project_id, source_node_id, target_node_id)
         VALUES ('e1', 'p1', 'n1', 'n1');",
    )
    .unwrap();

    let name: String = conn
        .query_row("SELECT name FROM projects WHERE id = 'p1';", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(name, "Untitled Project");

    let (page, rect_x, position_x): (i64, f64, f64) = conn
        .query_row(
            "SELECT page_index, rect_x, position_x FROM nodes WHERE id = 'n1';",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!((page, rect_x, position_x), (0, 0.0, 0.0));

    let edge_type: String = conn
        .query_row("SELECT edge_type FROM edges WHERE id = 'e1';", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(edge_type, "smoothstep");
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
