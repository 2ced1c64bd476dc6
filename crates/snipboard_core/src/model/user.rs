//! User account record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable user identifier.
pub type UserId = Uuid;

/// Account owning projects.
///
/// `zotero_id` links the account to the external identity provider. It is
/// indexed for lookup but not unique: several local accounts may share it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub zotero_id: Option<String>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}
