use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoRecord;

/// Inbound body of `POST /api/track/click`.
///
/// Every field is tolerated as absent at the serde layer; presence and
/// format checks happen in the handler so the contract's error messages
/// are produced instead of a generic deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickRequest {
    #[serde(default)]
    pub smartlink_id: String,
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub service_display_name: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Client-side timestamp; accepted but the recorded event is stamped
    /// server-side.
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// A single platform click, fully assembled by the handler and handed to
/// the recorder for persistence.
#[derive(Debug, Clone, Serialize)]
pub struct ClickEvent {
    pub smartlink_id: String,
    pub service_name: String,
    pub service_display_name: String,
    pub user_agent: String,
    pub geo: GeoRecord,
    pub session_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Outbound body for every outcome of the click endpoint.
///
/// `destination_url` is non-empty exactly when `success` is true, and a
/// successful response always carries a `tracking_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickTrackingResponse {
    pub success: bool,
    pub destination_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ClickTrackingResponse {
    pub fn success(destination_url: String, tracking_id: String) -> Self {
        Self {
            success: true,
            destination_url,
            tracking_id: Some(tracking_id),
            message: Some("Clic enregistré avec succès".to_string()),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            destination_url: String::new(),
            tracking_id: None,
            message: Some(message.into()),
        }
    }
}

/// Smart link identifiers are 24 hex characters (either case).
pub fn is_valid_smartlink_id(id: &str) -> bool {
    id.len() == 24 && id.bytes().all(|b| b.is_ascii_hexdigit())
}
