use super::model::{CheckInRequest, ErrorBody};
use super::server::ServerState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use tracing::{debug, error, info, warn};

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorBody::new(message))).into_response()
}

fn is_authorized(headers: &HeaderMap, device_token: &str) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token == device_token)
        .unwrap_or(false)
}

/// Handler for `POST /api/check-in`
pub async fn check_in_handler(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Result<Json<CheckInRequest>, JsonRejection>,
) -> Response {
    if !is_authorized(&headers, &state.device_token) {
        warn!("Rejected check-in with missing or invalid device token");
        return error_response(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Malformed check-in body: {}", rejection);
            return error_response(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };

    // Codes are matched exactly as sent, surrounding whitespace included
    let code = match request.code.as_deref() {
        Some(code) if !code.is_empty() => code,
        _ => return error_response(StatusCode::BAD_REQUEST, "Code is required"),
    };

    match state.store.check_in(code, Utc::now()).await {
        Ok(Some(invite)) => {
            info!("Checked in {} ({})", invite.id, invite.name);
            (StatusCode::OK, Json(invite)).into_response()
        }
        Ok(None) => {
            info!("Unknown invite code {}", code);
            error_response(StatusCode::NOT_FOUND, "Invalid invite code")
        }
        Err(e) => {
            error!("Check-in error: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// Handler for health check endpoint
pub async fn health_handler(State(state): State<ServerState>) -> Response {
    match state.store.count().await {
        Ok(invites) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "healthy",
                "invites": invites,
            })),
        )
            .into_response(),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "unhealthy",
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}
