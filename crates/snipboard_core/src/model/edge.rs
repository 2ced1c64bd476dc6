//! Edge model connecting two snippet nodes.
//!
//! # Invariants
//! - Both endpoints belong to the edge's project. Storage does not check
//!   this; `GraphService::connect` does.
//! - `edge_type` is a free rendering hint, never blank.

use crate::model::node::NodeId;
use crate::model::project::ProjectId;
use crate::model::{ensure_not_blank, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable edge identifier.
pub type EdgeId = Uuid;

/// Rendering style applied when none is given.
pub const DEFAULT_EDGE_TYPE: &str = "smoothstep";

/// Rendering styles understood by the canvas. Other values are stored as-is.
pub const KNOWN_EDGE_TYPES: [&str; 3] = ["smoothstep", "default", "straight"];

/// Persisted directed edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub project_id: ProjectId,
    pub source_node_id: NodeId,
    pub target_node_id: NodeId,
    pub label: Option<String>,
    pub edge_type: String,
}

/// Insert draft for [`Edge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEdge {
    pub project_id: ProjectId,
    pub source_node_id: NodeId,
    pub target_node_id: NodeId,
    pub label: Option<String>,
    pub edge_type: String,
}

impl NewEdge {
    /// Creates an unlabeled draft using [`DEFAULT_EDGE_TYPE`].
    pub fn new(project_id: ProjectId, source_node_id: NodeId, target_node_id: NodeId) -> Self {
        Self {
            project_id,
            source_node_id,
            target_node_id,
            label: None,
            edge_type: DEFAULT_EDGE_TYPE.to_string(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_edge_type(mut self, edge_type: impl Into<String>) -> Self {
        self.edge_type = edge_type.into();
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_not_blank(&self.edge_type, "edge type")
    }
}

/// Returns whether the canvas has a built-in renderer for `edge_type`.
pub fn is_known_edge_type(edge_type: &str) -> bool {
    KNOWN_EDGE_TYPES.contains(&edge_type)
}
