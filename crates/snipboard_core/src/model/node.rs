//! Snippet node model.
//!
//! # Responsibility
//! - Describe a text snippet extracted from a source document.
//! - Anchor it both in the document (page + rect) and on the canvas.
//!
//! # Invariants
//! - `content` and `source_document` are never blank.
//! - `zotero_item_key`, when set, uses the Zotero item-key alphabet.
//! - Location and position default to zero and are not range-checked.

use crate::model::geometry::Rect;
use crate::model::project::ProjectId;
use crate::model::{ensure_not_blank, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable node identifier.
pub type NodeId = Uuid;

static ZOTERO_ITEM_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{8}$").expect("valid zotero item key regex"));

/// Region of the source document the snippet was extracted from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    /// Zero-based page index.
    pub page_index: u32,
    pub rect: Rect,
}

/// Canvas coordinates of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasPosition {
    pub x: f64,
    pub y: f64,
}

impl CanvasPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Persisted snippet node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub project_id: ProjectId,
    /// Extracted text shown as the node label.
    pub content: String,
    pub zotero_item_key: Option<String>,
    /// PDF/HTML path the snippet came from.
    pub source_document: String,
    pub location: SourceLocation,
    pub position: CanvasPosition,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}

/// Insert draft for [`Node`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewNode {
    pub project_id: ProjectId,
    pub content: String,
    pub zotero_item_key: Option<String>,
    pub source_document: String,
    pub location: SourceLocation,
    pub position: CanvasPosition,
}

impl NewNode {
    /// Creates a draft with zeroed location and canvas position.
    pub fn new(
        project_id: ProjectId,
        content: impl Into<String>,
        source_document: impl Into<String>,
    ) -> Self {
        Self {
            project_id,
            content: content.into(),
            zotero_item_key: None,
            source_document: source_document.into(),
            location: SourceLocation::default(),
            position: CanvasPosition::default(),
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    pub fn with_position(mut self, position: CanvasPosition) -> Self {
        self.position = position;
        self
    }

    pub fn with_zotero_item_key(mut self, key: impl Into<String>) -> Self {
        self.zotero_item_key = Some(key.into());
        self
    }

    /// Checks draft invariants before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_not_blank(&self.content, "node content")?;
        ensure_not_blank(&self.source_document, "node source document")?;
        if let Some(key) = self.zotero_item_key.as_deref() {
            validate_zotero_item_key(key)?;
        }
        Ok(())
    }
}

/// Checks a Zotero item key (`ABCD2345` style).
pub fn validate_zotero_item_key(key: &str) -> Result<(), ValidationError> {
    if ZOTERO_ITEM_KEY_RE.is_match(key) {
        Ok(())
    } else {
        Err(ValidationError::InvalidZoteroItemKey(key.to_string()))
    }
}
