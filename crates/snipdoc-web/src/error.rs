use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use snipdoc_core::{DocError, ErrorKind};

use crate::models::ErrorResponse;

/// A [`DocError`] on its way to the client as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError(pub DocError);

impl From<DocError> for ApiError {
    fn from(err: DocError) -> Self {
        ApiError(err)
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::State | ErrorKind::Consistency => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::External => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(self.0.kind());
        let message = self.0.to_string();
        if status.is_server_error() {
            tracing::error!(error = %message, "request failed");
        } else {
            tracing::warn!(%status, error = %message, "request rejected");
        }
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Run blocking document or PDF work off the async executor.
pub async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, DocError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => Err(ApiError(DocError::Io(std::io::Error::other(format!(
            "worker task failed: {}",
            e
        ))))),
    }
}
