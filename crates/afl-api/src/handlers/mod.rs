//! API handlers

pub mod affiliate_links;
pub mod auth;
pub mod health;
pub mod platforms;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Confirmation returned by the create endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
    /// Id of the created record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
}

impl MessageResponse {
    pub fn created(message: impl Into<String>, id: Uuid) -> Self {
        Self {
            message: message.into(),
            id: Some(id),
        }
    }
}
