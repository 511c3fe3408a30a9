use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::header::{HeaderMap, USER_AGENT},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::geo::{extract_client_ip, GeoResolver};
use crate::models::{is_valid_smartlink_id, ClickEvent, ClickRequest, ClickTrackingResponse};
use crate::storage::{ClickRecorder, LinkRepository};
use crate::tracking::destination::build_destination_url;
use crate::tracking::error::TrackError;
use crate::tracking::rate_limit::RateLimiter;

pub struct TrackingState {
    pub repository: Arc<dyn LinkRepository>,
    pub recorder: Arc<dyn ClickRecorder>,
    pub geo: Arc<GeoResolver>,
    pub rate_limiter: Option<RateLimiter>,
    pub expose_errors: bool,
    pub debug_tracking_param: bool,
}

impl TrackingState {
    fn internal(&self, source: anyhow::Error) -> TrackError {
        TrackError::Internal {
            source,
            expose: self.expose_errors,
        }
    }
}

/// Track a platform click and resolve its redirect target
pub async fn track_click(
    State(state): State<Arc<TrackingState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<ClickRequest>, JsonRejection>,
) -> Result<Json<ClickTrackingResponse>, TrackError> {
    let client_ip = extract_client_ip(&headers, Some(addr.ip()));

    if let Some(limiter) = &state.rate_limiter {
        if !limiter.check(&client_ip) {
            return Err(TrackError::RateLimited);
        }
    }

    let Json(request) = payload.map_err(|_| TrackError::InvalidBody)?;

    if request.smartlink_id.is_empty() || request.service_name.is_empty() {
        return Err(TrackError::MissingFields);
    }
    if !is_valid_smartlink_id(&request.smartlink_id) {
        return Err(TrackError::InvalidSmartlinkId);
    }

    info!(
        smartlink = %request.smartlink_id,
        service = %request.service_name,
        "click received"
    );

    let geo = state.geo.resolve(&client_ip).await;
    debug!(
        country = %geo.country,
        region = %geo.region,
        ip = %client_ip,
        "client geolocated"
    );

    let stored_url = state
        .repository
        .destination_url(&request.smartlink_id, &request.service_name)
        .await
        .map_err(|err| state.internal(err))?;

    let Some(stored_url) = stored_url else {
        warn!(
            smartlink = %request.smartlink_id,
            service = %request.service_name,
            "no destination url registered"
        );
        return Err(TrackError::ServiceNotFound);
    };

    let user_agent = request
        .user_agent
        .filter(|ua| !ua.is_empty())
        .or_else(|| {
            headers
                .get(USER_AGENT)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "Unknown".to_string());

    let session_id = headers
        .get("x-session-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let event = ClickEvent {
        smartlink_id: request.smartlink_id.clone(),
        service_name: request.service_name.clone(),
        service_display_name: request
            .service_display_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| request.service_name.clone()),
        user_agent,
        geo,
        session_id,
        timestamp: Utc::now(),
    };

    let tracking_id = state
        .recorder
        .record(&event)
        .await
        .map_err(|err| state.internal(err))?;

    let destination_url = build_destination_url(
        &stored_url,
        &request.smartlink_id,
        &request.service_name,
        state
            .debug_tracking_param
            .then_some(tracking_id.as_str()),
    )
    .map_err(|err| state.internal(anyhow::Error::new(err)))?;

    info!(%tracking_id, "click recorded");

    Ok(Json(ClickTrackingResponse::success(
        destination_url,
        tracking_id,
    )))
}

/// JSON 405 for anything other than POST on the tracking route.
pub async fn method_not_allowed() -> TrackError {
    TrackError::MethodNotAllowed
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    #[derive(Serialize)]
    struct HealthResponse {
        status: String,
    }

    Json(HealthResponse {
        status: "OK".to_string(),
    })
}
