//! Project record.
//!
//! # Invariants
//! - `modified_at` is bumped by every repository write on the project or on
//!   the nodes/edges it owns.
//! - `name` defaults to [`DEFAULT_PROJECT_NAME`].

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable project identifier.
pub type ProjectId = Uuid;

/// Name given to projects created without one.
pub const DEFAULT_PROJECT_NAME: &str = "Untitled Project";

/// A research canvas owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    /// Owning account. `None` until an account is linked.
    pub user_id: Option<UserId>,
    pub name: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms timestamp of the latest mutation.
    pub modified_at: i64,
    /// Path of the PDF/HTML document currently open in the viewer.
    pub active_document: Option<String>,
}
