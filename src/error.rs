use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

/// Request-level error taxonomy. Maps onto HTTP status codes in one place
/// so handlers can use `?` end to end.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed request fields — 400.
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid, or expired bearer token — 401.
    #[error("{0}")]
    Auth(String),

    /// Referenced row does not exist — 404.
    #[error("{0}")]
    NotFound(String),

    /// LLM / speech / image / blob provider failure — 500.
    #[error("provider request failed: {0}")]
    Provider(#[source] anyhow::Error),

    /// Table read/write failure — 500.
    #[error("storage failure: {0}")]
    Persistence(#[from] crate::store::StoreError),

    /// Provider output did not match the required shape — 500.
    #[error("malformed provider output: {0}")]
    Parse(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Provider(_) | ApiError::Persistence(_) | ApiError::Parse(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // 4xx messages are safe to show; 5xx detail stays in the server log.
        let body = if status.is_server_error() {
            error!("request failed: {self:#}");
            "Something went wrong on our side.".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(serde_json::json!({ "success": false, "error": body })),
        )
            .into_response()
    }
}
