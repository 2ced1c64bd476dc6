//! Snippet graph use-case service.
//!
//! # Responsibility
//! - Capture text selections from the viewer as nodes with highlights.
//! - Connect, relabel and remove nodes and edges of one project.
//! - Load a project's whole graph for the canvas.
//!
//! # Invariants
//! - Both endpoints of an edge belong to the edge's project.
//! - Captured rectangles are stored in scale-1.0 page coordinates.
//! - A node's source rect is the bounding box of its stored highlights.

use crate::model::edge::{is_known_edge_type, Edge, EdgeId, NewEdge};
use crate::model::geometry::{bounding_box, prepare_selection, Rect};
use crate::model::node::{CanvasPosition, NewNode, Node, NodeId, SourceLocation};
use crate::model::project::ProjectId;
use crate::model::ValidationError;
use crate::repo::edge_repo::EdgeRepository;
use crate::repo::node_repo::{GraphNode, NodeRepository, NodeWithHighlights};
use crate::repo::RepoError;
use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

/// Service error for graph use-cases.
#[derive(Debug, Error)]
pub enum GraphServiceError {
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),
    #[error("edge not found: {0}")]
    EdgeNotFound(EdgeId),
    /// Edge endpoint lives in a different project than the edge.
    #[error("node {node_id} does not belong to project {project_id}")]
    EndpointOutsideProject {
        node_id: NodeId,
        project_id: ProjectId,
    },
    #[error("invalid viewer scale: {0}")]
    InvalidScale(f64),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for GraphServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "project",
                id,
            } => Self::ProjectNotFound(id),
            RepoError::NotFound { entity: "node", id } => Self::NodeNotFound(id),
            RepoError::NotFound { entity: "edge", id } => Self::EdgeNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

pub type GraphServiceResult<T> = Result<T, GraphServiceError>;

/// Selection captured in the document viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct SnippetCapture {
    pub project_id: ProjectId,
    pub content: String,
    pub source_document: String,
    pub page_index: u32,
    /// Selection rectangles in viewer coordinates.
    pub rects: Vec<Rect>,
    /// Viewer zoom the rectangles were captured at.
    pub scale: f64,
    pub color: Option<String>,
    pub zotero_item_key: Option<String>,
    pub position: CanvasPosition,
}

/// Nodes (with their comments and highlights) and edges of one project,
/// ready for the canvas.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<Edge>,
}

/// Graph service facade over repository implementations.
pub struct GraphService<N: NodeRepository, E: EdgeRepository> {
    nodes: N,
    edges: E,
}

impl<N: NodeRepository, E: EdgeRepository> GraphService<N, E> {
    pub fn new(nodes: N, edges: E) -> Self {
        Self { nodes, edges }
    }

    pub fn add_node(&self, node: &NewNode) -> GraphServiceResult<Node> {
        Ok(self.nodes.create_node(node)?)
    }

    /// Stores a viewer selection as one node plus one highlight per merged
    /// line rectangle.
    ///
    /// A selection whose rectangles are all filtered out still creates the
    /// node, with a zero source rect and no highlights.
    pub fn capture_snippet(
        &self,
        capture: &SnippetCapture,
    ) -> GraphServiceResult<NodeWithHighlights> {
        let rects = prepare_selection(&capture.rects, capture.scale)
            .ok_or(GraphServiceError::InvalidScale(capture.scale))?;

        let mut draft = NewNode::new(
            capture.project_id,
            capture.content.trim(),
            capture.source_document.as_str(),
        )
        .with_location(SourceLocation {
            page_index: capture.page_index,
            rect: bounding_box(&rects).unwrap_or_default(),
        })
        .with_position(capture.position);
        if let Some(key) = capture.zotero_item_key.as_deref() {
            draft = draft.with_zotero_item_key(key);
        }

        let stored =
            self.nodes
                .create_node_with_highlights(&draft, &rects, capture.color.as_deref())?;
        info!(
            "event=snippet_capture module=service status=ok project_id={} node_id={} raw_rects={} stored_rects={}",
            capture.project_id,
            stored.node.id,
            capture.rects.len(),
            stored.highlights.len()
        );
        Ok(stored)
    }

    pub fn get_node(&self, node_id: NodeId) -> GraphServiceResult<Node> {
        self.nodes
            .get_node(node_id)?
            .ok_or(GraphServiceError::NodeNotFound(node_id))
    }

    pub fn move_node(
        &self,
        node_id: NodeId,
        position: CanvasPosition,
    ) -> GraphServiceResult<Node> {
        self.nodes.move_node(node_id, position)?;
        self.get_node(node_id)
    }

    pub fn edit_node_content(&self, node_id: NodeId, content: &str) -> GraphServiceResult<Node> {
        self.nodes.update_content(node_id, content.trim())?;
        self.get_node(node_id)
    }

    /// Deletes a node together with its edges, comments and highlights.
    pub fn remove_node(&self, node_id: NodeId) -> GraphServiceResult<()> {
        let detached = self.edges.list_edges_for_node(node_id)?.len();
        self.nodes.delete_node(node_id)?;
        info!(
            "event=node_remove module=service status=ok node_id={node_id} detached_edges={detached}"
        );
        Ok(())
    }

    /// Connects two nodes of the edge's project. Self-loops are allowed.
    pub fn connect(&self, edge: &NewEdge) -> GraphServiceResult<Edge> {
        for node_id in [edge.source_node_id, edge.target_node_id] {
            let node = self.get_node(node_id)?;
            if node.project_id != edge.project_id {
                return Err(GraphServiceError::EndpointOutsideProject {
                    node_id,
                    project_id: edge.project_id,
                });
            }
        }
        if !is_known_edge_type(&edge.edge_type) {
            warn!(
                "event=edge_connect module=service status=unknown_type edge_type={}",
                edge.edge_type
            );
        }
        Ok(self.edges.create_edge(edge)?)
    }

    /// Replaces the edge label. `None` or a blank label removes it.
    pub fn relabel_edge(&self, edge_id: EdgeId, label: Option<&str>) -> GraphServiceResult<Edge> {
        let edge = self.get_edge(edge_id)?;
        let label = label.map(str::trim).filter(|value| !value.is_empty());
        self.edges.update_edge(edge_id, label, &edge.edge_type)?;
        self.get_edge(edge_id)
    }

    /// Changes how the canvas draws the edge.
    pub fn set_edge_type(&self, edge_id: EdgeId, edge_type: &str) -> GraphServiceResult<Edge> {
        let edge = self.get_edge(edge_id)?;
        self.edges
            .update_edge(edge_id, edge.label.as_deref(), edge_type.trim())?;
        self.get_edge(edge_id)
    }

    pub fn get_edge(&self, edge_id: EdgeId) -> GraphServiceResult<Edge> {
        self.edges
            .get_edge(edge_id)?
            .ok_or(GraphServiceError::EdgeNotFound(edge_id))
    }

    pub fn disconnect(&self, edge_id: EdgeId) -> GraphServiceResult<()> {
        Ok(self.edges.delete_edge(edge_id)?)
    }

    /// Loads every node, annotation and edge of one project.
    ///
    /// Fails with `ProjectNotFound` when the project does not exist.
    pub fn load_graph(&self, project_id: ProjectId) -> GraphServiceResult<ProjectGraph> {
        Ok(ProjectGraph {
            nodes: self.nodes.list_graph_nodes(project_id)?,
            edges: self.edges.list_edges(project_id)?,
        })
    }
}
