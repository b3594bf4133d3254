use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use opine_common::error::OpineError;

pub struct ApiError(pub OpineError);

impl From<OpineError> for ApiError {
    fn from(err: OpineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            OpineError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            OpineError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            other => {
                tracing::error!(error = %other, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}
