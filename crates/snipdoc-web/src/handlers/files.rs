use axum::Json;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use snipdoc_core::DocError;

use crate::error::{ApiError, blocking, status_for};
use crate::models::{ContentResponse, CreateFileRequest, CreateFileResponse, NameQuery};
use crate::state::AppState;

const DEFAULT_NEW_FILE: &str = "Untitled.docx";

fn required_name(query: NameQuery) -> Result<String, ApiError> {
    query
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError(DocError::validation("File name not provided")))
}

pub async fn list_files(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, ApiError> {
    let store = Arc::clone(&state.store);
    let files = blocking(move || store.list()).await?;
    Ok(Json(files))
}

pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NameQuery>,
) -> Result<Json<ContentResponse>, ApiError> {
    let name = required_name(query)?;
    let store = Arc::clone(&state.store);
    let content = blocking(move || store.read_text(&name)).await?;
    Ok(Json(ContentResponse { content }))
}

/// Document text as a plain-text body.
pub async fn view_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NameQuery>,
) -> Result<Response, ApiError> {
    let name = required_name(query)?;
    let store = Arc::clone(&state.store);
    let content = blocking(move || store.read_text(&name)).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        content,
    )
        .into_response())
}

pub async fn create_file(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateFileRequest>,
) -> Response {
    let name = req
        .file_name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_NEW_FILE.to_string());
    let store = Arc::clone(&state.store);

    // This endpoint reports failures as {success, message} rather than {error}.
    match blocking(move || store.create(&name)).await {
        Ok(_) => Json(CreateFileResponse {
            success: true,
            message: "File created successfully".to_string(),
        })
        .into_response(),
        Err(ApiError(e)) => {
            let status = status_for(e.kind());
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                tracing::error!(error = %e, "create failed");
            } else {
                tracing::warn!(error = %e, "create rejected");
            }
            (
                status,
                Json(CreateFileResponse {
                    success: false,
                    message: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
