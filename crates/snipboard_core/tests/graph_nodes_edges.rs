use rusqlite::Connection;
use snipboard_core::{
    open_db_in_memory, CanvasPosition, GraphService, GraphServiceError, NewEdge, NewNode,
    ProjectId, ProjectRepository, Rect, SnippetCapture, SourceLocation, SqliteEdgeRepository,
    SqliteNodeRepository, SqliteProjectRepository, RepoError, DEFAULT_EDGE_TYPE,
};
use uuid::Uuid;

type Service<'conn> = GraphService<SqliteNodeRepository<'conn>, SqliteEdgeRepository<'conn>>;

fn service(conn: &Connection) -> Service<'_> {
    GraphService::new(
        SqliteNodeRepository::try_new(conn).unwrap(),
        SqliteEdgeRepository::try_new(conn).unwrap(),
    )
}

fn new_project(conn: &Connection) -> ProjectId {
    SqliteProjectRepository::try_new(conn)
        .unwrap()
        .create_project(None, "Graph")
        .unwrap()
        .id
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn add_node_applies_zero_defaults() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let project_id = new_project(&conn);

    let node = service
        .add_node(&NewNode::new(project_id, "Attention is all you need", "paper.pdf"))
        .unwrap();
    assert_eq!(node.project_id, project_id);
    assert_eq!(node.location, SourceLocation::default());
    assert_eq!(node.position, CanvasPosition::new(0.0, 0.0));
    assert!(node.zotero_item_key.is_none());
    assert!(node.created_at > 0);
    assert_eq!(service.get_node(node.id).unwrap(), node);
}

#[test]
fn add_node_rejects_unknown_project_and_bad_drafts() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let project_id = new_project(&conn);

    let missing = Uuid::new_v4();
    let err = service
        .add_node(&NewNode::new(missing, "text", "paper.pdf"))
        .unwrap_err();
    assert!(matches!(err, GraphServiceError::ProjectNotFound(id) if id == missing));

    let err = service
        .add_node(&NewNode::new(project_id, " ", "paper.pdf"))
        .unwrap_err();
    assert!(matches!(err, GraphServiceError::Validation(_)));

    let err = service
        .add_node(&NewNode::new(project_id, "text", "paper.pdf").with_zotero_item_key("abc"))
        .unwrap_err();
    assert!(matches!(err, GraphServiceError::Validation(_)));
    assert_eq!(count(&conn, "nodes"), 0);
}

#[test]
fn move_and_edit_node() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let project_id = new_project(&conn);
    let node = service
        .add_node(&NewNode::new(project_id, "draft", "paper.pdf"))
        .unwrap();

    let moved = service
        .move_node(node.id, CanvasPosition::new(120.5, -40.0))
        .unwrap();
    assert_eq!(moved.position, CanvasPosition::new(120.5, -40.0));

    let edited = service.edit_node_content(node.id, " final ").unwrap();
    assert_eq!(edited.content, "final");

    let missing = Uuid::new_v4();
    assert!(matches!(
        service.move_node(missing, CanvasPosition::default()).unwrap_err(),
        GraphServiceError::NodeNotFound(id) if id == missing
    ));
}

#[test]
fn capture_snippet_normalizes_merges_and_stores_highlights() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let project_id = new_project(&conn);

    let capture = SnippetCapture {
        project_id,
        content: "  multi-line quote ".to_string(),
        source_document: "/papers/a.pdf".to_string(),
        page_index: 3,
        rects: vec![
            Rect::new(0.0, 200.0, 100.0, 20.0),
            Rect::new(110.0, 202.0, 60.0, 20.0),
            Rect::new(0.0, 240.0, 80.0, 20.0),
            Rect::new(300.0, 300.0, 1.0, 1.0),
        ],
        scale: 2.0,
        color: Some("rgba(255, 0, 0, 0.3)".to_string()),
        zotero_item_key: Some("ABCD2345".to_string()),
        position: CanvasPosition::new(10.0, 20.0),
    };

    let stored = service.capture_snippet(&capture).unwrap();
    assert_eq!(stored.node.content, "multi-line quote");
    assert_eq!(stored.node.location.page_index, 3);
    assert_eq!(stored.node.location.rect, Rect::new(0.0, 100.0, 85.0, 30.0));
    assert_eq!(stored.node.zotero_item_key.as_deref(), Some("ABCD2345"));
    assert_eq!(stored.node.position, CanvasPosition::new(10.0, 20.0));

    let rects: Vec<Rect> = stored.highlights.iter().map(|h| h.rect).collect();
    assert_eq!(
        rects,
        vec![
            Rect::new(0.0, 100.0, 85.0, 10.0),
            Rect::new(0.0, 120.0, 40.0, 10.0),
        ]
    );
    for highlight in &stored.highlights {
        assert_eq!(highlight.node_id, stored.node.id);
        assert_eq!(highlight.document_path, "/papers/a.pdf");
        assert_eq!(highlight.page_index, 3);
        assert_eq!(highlight.color.as_deref(), Some("rgba(255, 0, 0, 0.3)"));
    }
}

#[test]
fn capture_snippet_rejects_invalid_scale_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let project_id = new_project(&conn);

    let capture = SnippetCapture {
        project_id,
        content: "quote".to_string(),
        source_document: "a.pdf".to_string(),
        page_index: 0,
        rects: vec![Rect::new(0.0, 0.0, 10.0, 10.0)],
        scale: 0.0,
        color: None,
        zotero_item_key: None,
        position: CanvasPosition::default(),
    };
    assert!(matches!(
        service.capture_snippet(&capture).unwrap_err(),
        GraphServiceError::InvalidScale(_)
    ));
    assert_eq!(count(&conn, "nodes"), 0);
}

#[test]
fn capture_snippet_is_atomic_when_node_is_invalid() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let capture = SnippetCapture {
        project_id: Uuid::new_v4(),
        content: "quote".to_string(),
        source_document: "a.pdf".to_string(),
        page_index: 0,
        rects: vec![Rect::new(0.0, 0.0, 10.0, 10.0)],
        scale: 1.0,
        color: None,
        zotero_item_key: None,
        position: CanvasPosition::default(),
    };
    assert!(matches!(
        service.capture_snippet(&capture).unwrap_err(),
        GraphServiceError::ProjectNotFound(_)
    ));
    assert_eq!(count(&conn, "nodes"), 0);
    assert_eq!(count(&conn, "highlights"), 0);
}

#[test]
fn connect_defaults_edge_type_and_allows_self_loops() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let project_id = new_project(&conn);
    let a = service
        .add_node(&NewNode::new(project_id, "a", "paper.pdf"))
        .unwrap();
    let b = service
        .add_node(&NewNode::new(project_id, "b", "paper.pdf"))
        .unwrap();

    let edge = service.connect(&NewEdge::new(project_id, a.id, b.id)).unwrap();
    assert_eq!(edge.edge_type, DEFAULT_EDGE_TYPE);
    assert!(edge.label.is_none());

    let self_loop = service
        .connect(&NewEdge::new(project_id, a.id, a.id).with_label("restates"))
        .unwrap();
    assert_eq!(self_loop.source_node_id, self_loop.target_node_id);

    let graph = service.load_graph(project_id).unwrap();
    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(
        graph.edges.iter().map(|e| e.id).collect::<Vec<_>>(),
        vec![edge.id, self_loop.id]
    );
}

#[test]
fn connect_rejects_endpoints_outside_project() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let first = new_project(&conn);
    let second = new_project(&conn);
    let a = service.add_node(&NewNode::new(first, "a", "p.pdf")).unwrap();
    let b = service.add_node(&NewNode::new(second, "b", "p.pdf")).unwrap();

    let err = service.connect(&NewEdge::new(first, a.id, b.id)).unwrap_err();
    assert!(matches!(
        err,
        GraphServiceError::EndpointOutsideProject { node_id, project_id }
            if node_id == b.id && project_id == first
    ));

    let missing = Uuid::new_v4();
    let err = service
        .connect(&NewEdge::new(first, missing, a.id))
        .unwrap_err();
    assert!(matches!(err, GraphServiceError::NodeNotFound(id) if id == missing));
    assert_eq!(count(&conn, "edges"), 0);
}

#[test]
fn relabel_restyle_and_disconnect_edge() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let project_id = new_project(&conn);
    let a = service.add_node(&NewNode::new(project_id, "a", "p.pdf")).unwrap();
    let b = service.add_node(&NewNode::new(project_id, "b", "p.pdf")).unwrap();
    let edge = service.connect(&NewEdge::new(project_id, a.id, b.id)).unwrap();

    let labeled = service.relabel_edge(edge.id, Some(" supports ")).unwrap();
    assert_eq!(labeled.label.as_deref(), Some("supports"));

    let styled = service.set_edge_type(edge.id, "straight").unwrap();
    assert_eq!(styled.edge_type, "straight");
    assert_eq!(styled.label.as_deref(), Some("supports"));

    let cleared = service.relabel_edge(edge.id, Some("")).unwrap();
    assert!(cleared.label.is_none());

    assert!(matches!(
        service.set_edge_type(edge.id, " ").unwrap_err(),
        GraphServiceError::Validation(_)
    ));

    service.disconnect(edge.id).unwrap();
    assert!(matches!(
        service.disconnect(edge.id).unwrap_err(),
        GraphServiceError::EdgeNotFound(id) if id == edge.id
    ));
}

#[test]
fn remove_node_cascades_to_edges_and_annotations() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let project_id = new_project(&conn);
    let a = service.add_node(&NewNode::new(project_id, "a", "p.pdf")).unwrap();
    let b = service.add_node(&NewNode::new(project_id, "b", "p.pdf")).unwrap();
    service.connect(&NewEdge::new(project_id, a.id, b.id)).unwrap();
    service.connect(&NewEdge::new(project_id, b.id, a.id)).unwrap();
    conn.execute(
        "INSERT INTO comments (id, node_id, text) VALUES ('c1', ?1, 'note');",
        [a.id.to_string()],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO highlights (id, node_id, document_path, page_index, rect_x, rect_y, rect_width, rect_height)
         VALUES ('h1', ?1, 'p.pdf', 0, 0, 0, 10, 10);",
        [a.id.to_string()],
    )
    .unwrap();

    service.remove_node(a.id).unwrap();

    assert_eq!(count(&conn, "edges"), 0);
    assert_eq!(count(&conn, "comments"), 0);
    assert_eq!(count(&conn, "highlights"), 0);
    let graph = service.load_graph(project_id).unwrap();
    let remaining: Vec<_> = graph.nodes.into_iter().map(|entry| entry.node).collect();
    assert_eq!(remaining, vec![b]);
}

#[test]
fn deleting_project_removes_whole_graph() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let project_id = new_project(&conn);
    let a = service.add_node(&NewNode::new(project_id, "a", "p.pdf")).unwrap();
    service.connect(&NewEdge::new(project_id, a.id, a.id)).unwrap();

    SqliteProjectRepository::try_new(&conn)
        .unwrap()
        .delete_project(project_id)
        .unwrap();

    assert_eq!(count(&conn, "nodes"), 0);
    assert_eq!(count(&conn, "edges"), 0);
    assert!(matches!(
        service.load_graph(project_id).unwrap_err(),
        GraphServiceError::ProjectNotFound(id) if id == project_id
    ));
}

#[test]
fn node_writes_bump_project_modified_at() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let project_id = new_project(&conn);
    conn.execute(
        "UPDATE projects SET modified_at = 0 WHERE id = ?1;",
        [project_id.to_string()],
    )
    .unwrap();

    service
        .add_node(&NewNode::new(project_id, "a", "p.pdf").with_location(SourceLocation {
            page_index: 1,
            rect: Rect::new(1.0, 2.0, 3.0, 4.0),
        }))
        .unwrap();

    let project = SqliteProjectRepository::try_new(&conn)
        .unwrap()
        .get_project(project_id)
        .unwrap()
        .unwrap();
    assert!(project.modified_at > 0);
}

#[test]
fn load_graph_rejects_unknown_project() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let missing = Uuid::new_v4();
    assert!(matches!(
        service.load_graph(missing).unwrap_err(),
        GraphServiceError::ProjectNotFound(id) if id == missing
    ));
}

#[test]
fn load_graph_groups_annotations_per_node() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let project_id = new_project(&conn);
    let a = service.add_node(&NewNode::new(project_id, "a", "p.pdf")).unwrap();
    let b = service.add_node(&NewNode::new(project_id, "b", "p.pdf")).unwrap();
    for (node_id, text) in [(a.id, "first"), (b.id, "other"), (a.id, "second")] {
        conn.execute(
            "INSERT INTO comments (id, node_id, text) VALUES (?1, ?2, ?3);",
            [Uuid::new_v4().to_string(), node_id.to_string(), text.to_string()],
        )
        .unwrap();
    }
    conn.execute(
        "INSERT INTO highlights (id, node_id, document_path, page_index, rect_x, rect_y, rect_width, rect_height)
         VALUES (?1, ?2, 'p.pdf', 2, 0, 0, 10, 10);",
        [Uuid::new_v4().to_string(), b.id.to_string()],
    )
    .unwrap();

    let graph = service.load_graph(project_id).unwrap();
    assert_eq!(graph.nodes.len(), 2);
    let first = &graph.nodes[0];
    assert_eq!(first.node.id, a.id);
    assert_eq!(
        first.comments.iter().map(|c| c.text.as_str()).collect::<Vec<_>>(),
        vec!["first", "second"]
    );
    assert!(first.highlights.is_empty());

    let second = &graph.nodes[1];
    assert_eq!(second.comments.len(), 1);
    assert_eq!(second.highlights.len(), 1);
    assert_eq!(second.highlights[0].page_index, 2);
}

#[test]
fn negative_page_index_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let project_id = new_project(&conn);
    let node = service.add_node(&NewNode::new(project_id, "a", "p.pdf")).unwrap();
    conn.execute(
        "UPDATE nodes SET page_index = -1 WHERE id = ?1;",
        [node.id.to_string()],
    )
    .unwrap();

    let err = service.get_node(node.id).unwrap_err();
    assert!(matches!(
        err,
        GraphServiceError::Repo(RepoError::InvalidData(message)) if message.contains("page index")
    ));

    conn.execute(
        "UPDATE nodes SET page_index = 0 WHERE id = ?1;",
        [node.id.to_string()],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO highlights (id, node_id, document_path, page_index, rect_x, rect_y, rect_width, rect_height)
         VALUES (?1, ?2, 'p.pdf', 4294967296, 0, 0, 10, 10);",
        [Uuid::new_v4().to_string(), node.id.to_string()],
    )
    .unwrap();
    let err = service.load_graph(project_id).unwrap_err();
    assert!(matches!(
        err,
        GraphServiceError::Repo(RepoError::InvalidData(message))
            if message.contains("highlights.page_index")
    ));
}
