use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ClickTrackingResponse;

/// Every failure of the click endpoint. All variants render as a
/// well-formed [`ClickTrackingResponse`] body so callers can branch on
/// `success` without null-checking `destinationUrl`.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("Méthode non autorisée. Utilisez POST.")]
    MethodNotAllowed,
    #[error("Corps de requête JSON invalide.")]
    InvalidBody,
    #[error("smartlinkId et serviceName sont requis.")]
    MissingFields,
    #[error("Format de smartlinkId invalide.")]
    InvalidSmartlinkId,
    #[error("Service non trouvé pour ce SmartLink.")]
    ServiceNotFound,
    #[error("Trop de requêtes. Veuillez patienter.")]
    RateLimited,
    #[error("Erreur interne du serveur")]
    Internal {
        #[source]
        source: anyhow::Error,
        expose: bool,
    },
}

impl TrackError {
    fn status(&self) -> StatusCode {
        match self {
            TrackError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            TrackError::InvalidBody | TrackError::MissingFields | TrackError::InvalidSmartlinkId => {
                StatusCode::BAD_REQUEST
            }
            TrackError::ServiceNotFound => StatusCode::NOT_FOUND,
            TrackError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            TrackError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            TrackError::Internal {
                source,
                expose: true,
            } => format!("Erreur interne: {source}"),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for TrackError {
    fn into_response(self) -> Response {
        if let TrackError::Internal { source, .. } = &self {
            tracing::error!(error = ?source, "click tracking request failed");
        }

        (
            self.status(),
            Json(ClickTrackingResponse::failure(self.message())),
        )
            .into_response()
    }
}
