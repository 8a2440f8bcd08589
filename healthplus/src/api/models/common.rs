//! Response shapes shared across resources.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Acknowledgement for a create, update or delete.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    /// Id of the created row, on creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            id: None,
        }
    }

    pub fn created(message: impl Into<String>, id: i64) -> Self {
        Self {
            success: true,
            message: message.into(),
            id: Some(id),
        }
    }
}

/// True when a required text field is missing or only whitespace
pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Treat an empty optional text field as absent
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
