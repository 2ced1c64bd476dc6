//! Comment and highlight annotations attached to nodes.
//!
//! # Invariants
//! - `Comment::edited_at` stays `None` until the first edit.
//! - One [`Highlight`] row stores exactly one rectangle.

use crate::model::geometry::Rect;
use crate::model::node::NodeId;
use crate::model::{ensure_not_blank, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CommentId = Uuid;
pub type HighlightId = Uuid;

/// Free-text note on a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub node_id: NodeId,
    pub text: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms timestamp of the latest edit.
    pub edited_at: Option<i64>,
}

impl Comment {
    pub fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }
}

/// Checks comment text before it is written.
pub fn validate_comment_text(text: &str) -> Result<(), ValidationError> {
    ensure_not_blank(text, "comment text")
}

/// Rectangle on a document page anchoring a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub id: HighlightId,
    pub node_id: NodeId,
    pub document_path: String,
    /// Zero-based page index.
    pub page_index: u32,
    pub rect: Rect,
    /// CSS color; the viewer falls back to translucent yellow.
    pub color: Option<String>,
}

/// Insert draft for [`Highlight`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewHighlight {
    pub node_id: NodeId,
    pub document_path: String,
    pub page_index: u32,
    pub rect: Rect,
    pub color: Option<String>,
}

impl NewHighlight {
    pub fn new(
        node_id: NodeId,
        document_path: impl Into<String>,
        page_index: u32,
        rect: Rect,
    ) -> Self {
        Self {
            node_id,
            document_path: document_path.into(),
            page_index,
            rect,
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_not_blank(&self.document_path, "highlight document path")
    }
}
