//! Persistence core for a research-snippet canvas.
//! Users own projects; projects hold a graph of snippet nodes and edges;
//! nodes carry comments and page highlights. This crate owns the SQLite
//! schema and every invariant over it.

pub mod config;
pub mod db;
pub mod integrity;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{load_config, ConfigError, SnipboardConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use integrity::{check_integrity, IntegrityReport};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::annotation::{Comment, CommentId, Highlight, HighlightId, NewHighlight};
pub use model::edge::{Edge, EdgeId, NewEdge, DEFAULT_EDGE_TYPE};
pub use model::geometry::Rect;
pub use model::node::{CanvasPosition, NewNode, Node, NodeId, SourceLocation};
pub use model::project::{Project, ProjectId, DEFAULT_PROJECT_NAME};
pub use model::user::{User, UserId};
pub use model::ValidationError;
pub use repo::comment_repo::{CommentRepository, SqliteCommentRepository};
pub use repo::edge_repo::{EdgeRepository, SqliteEdgeRepository};
pub use repo::highlight_repo::{HighlightRepository, SqliteHighlightRepository};
pub use repo::node_repo::{GraphNode, NodeRepository, NodeWithHighlights, SqliteNodeRepository};
pub use repo::project_repo::{ProjectRepository, SqliteProjectRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::annotation_service::{AnnotationService, AnnotationServiceError};
pub use service::graph_service::{GraphService, GraphServiceError, ProjectGraph, SnippetCapture};
pub use service::project_service::{ProjectService, ProjectServiceError};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
