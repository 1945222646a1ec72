use axum::Json;
use axum::extract::State;
use std::sync::Arc;

use snipdoc_core::DocError;

use crate::error::{ApiError, blocking};
use crate::models::{UndoRequest, UndoResponse};
use crate::state::AppState;

pub async fn undo_last_text(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UndoRequest>,
) -> Result<Json<UndoResponse>, ApiError> {
    let name = req
        .file_name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError(DocError::validation("File name not provided")))?;

    let store = Arc::clone(&state.store);
    let outcome = blocking(move || store.undo(&name)).await?;

    Ok(Json(UndoResponse {
        message: "Last added text removed successfully".to_string(),
        remaining_undos: outcome.remaining,
    }))
}
