use rusqlite::Connection;
use snipboard_core::{
    open_db_in_memory, ProjectRepository, ProjectService, ProjectServiceError,
    SqliteProjectRepository, SqliteUserRepository, UserRepository, ValidationError,
    DEFAULT_PROJECT_NAME,
};
use uuid::Uuid;

type Service<'conn> = ProjectService<SqliteUserRepository<'conn>, SqliteProjectRepository<'conn>>;

fn service(conn: &Connection) -> Service<'_> {
    ProjectService::new(
        SqliteUserRepository::try_new(conn).unwrap(),
        SqliteProjectRepository::try_new(conn).unwrap(),
    )
}

#[test]
fn register_user_sets_creation_timestamp() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let anonymous = service.register_user(None).unwrap();
    assert!(anonymous.zotero_id.is_none());
    assert!(anonymous.created_at > 0);

    let linked = service.register_user(Some(" 1234567 ")).unwrap();
    assert_eq!(linked.zotero_id.as_deref(), Some("1234567"));
    assert_eq!(service.get_user(linked.id).unwrap(), Some(linked));
}

#[test]
fn user_for_zotero_id_reuses_existing_user() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let first = service.user_for_zotero_id("998877").unwrap();
    let second = service.user_for_zotero_id("998877").unwrap();
    assert_eq!(first.id, second.id);

    let err = service.user_for_zotero_id("   ").unwrap_err();
    assert!(matches!(
        err,
        ProjectServiceError::Validation(ValidationError::Blank { .. })
    ));
}

#[test]
fn create_project_defaults_blank_or_missing_name() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = service.register_user(None).unwrap();

    let unnamed = service.create_project(Some(user.id), None).unwrap();
    assert_eq!(unnamed.name, DEFAULT_PROJECT_NAME);
    assert_eq!(unnamed.user_id, Some(user.id));
    assert!(unnamed.created_at > 0);
    assert_eq!(unnamed.created_at, unnamed.modified_at);
    assert!(unnamed.active_document.is_none());

    let blank = service.create_project(Some(user.id), Some("  ")).unwrap();
    assert_eq!(blank.name, DEFAULT_PROJECT_NAME);

    let named = service
        .create_project(Some(user.id), Some("  Thesis chapter 2 "))
        .unwrap();
    assert_eq!(named.name, "Thesis chapter 2");
}

#[test]
fn create_project_allows_missing_owner_but_rejects_unknown_owner() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let orphan = service.create_project(None, Some("Scratch")).unwrap();
    assert!(orphan.user_id.is_none());

    let unknown = Uuid::new_v4();
    let err = service.create_project(Some(unknown), None).unwrap_err();
    assert!(matches!(err, ProjectServiceError::UserNotFound(id) if id == unknown));
}

#[test]
fn rename_and_open_document_update_project() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let project = service.create_project(None, None).unwrap();

    let renamed = service.rename_project(project.id, " Reading list ").unwrap();
    assert_eq!(renamed.name, "Reading list");
    assert!(renamed.modified_at >= project.modified_at);

    let err = service.rename_project(project.id, "").unwrap_err();
    assert!(matches!(err, ProjectServiceError::Validation(_)));

    let opened = service
        .open_document(project.id, Some("/papers/attention.pdf"))
        .unwrap();
    assert_eq!(
        opened.active_document.as_deref(),
        Some("/papers/attention.pdf")
    );
    let closed = service.open_document(project.id, None).unwrap();
    assert!(closed.active_document.is_none());

    let missing = Uuid::new_v4();
    assert!(matches!(
        service.rename_project(missing, "x").unwrap_err(),
        ProjectServiceError::ProjectNotFound(id) if id == missing
    ));
}

#[test]
fn list_projects_orders_by_most_recent_modification() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = service.register_user(None).unwrap();
    let other = service.register_user(None).unwrap();

    let older = service.create_project(Some(user.id), Some("older")).unwrap();
    let newer = service.create_project(Some(user.id), Some("newer")).unwrap();
    service.create_project(Some(other.id), Some("foreign")).unwrap();
    conn.execute(
        "UPDATE projects SET modified_at = modified_at + 60000 WHERE id = ?1;",
        [newer.id.to_string()],
    )
    .unwrap();

    let names: Vec<String> = service
        .list_projects(user.id)
        .unwrap()
        .into_iter()
        .map(|project| project.name)
        .collect();
    assert_eq!(names, vec!["newer".to_string(), older.name]);
}

#[test]
fn deleting_user_cascades_to_projects() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = service.register_user(None).unwrap();
    let project = service.create_project(Some(user.id), None).unwrap();

    service.delete_user(user.id).unwrap();

    let projects = SqliteProjectRepository::try_new(&conn).unwrap();
    assert!(projects.get_project(project.id).unwrap().is_none());
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    assert!(users.get_user(user.id).unwrap().is_none());
    assert!(matches!(
        service.delete_project(project.id).unwrap_err(),
        ProjectServiceError::ProjectNotFound(_)
    ));
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    assert!(SqliteProjectRepository::try_new(&conn).is_err());
}
