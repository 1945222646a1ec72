use axum::Json;
use axum::extract::{Multipart, State};
use std::sync::Arc;

use snipdoc_core::{DocError, extract_pdf_text};

use crate::error::{ApiError, blocking};
use crate::models::TextResponse;
use crate::state::AppState;
use crate::upload;

pub async fn extract(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<TextResponse>, ApiError> {
    let file = upload::parse_pdf_upload(multipart).await?;
    let filename = file.filename;
    let data = file.data;

    // Extract text (blocking I/O via the PDF backend)
    let backend = Arc::clone(&state.pdf);
    let text = blocking(move || extract_pdf_text(backend.as_ref(), &data).map_err(DocError::from))
        .await?;

    tracing::info!(%filename, chars = text.chars().count(), "extracted PDF text");
    Ok(Json(TextResponse { text }))
}
