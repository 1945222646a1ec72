use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::services::ServeDir;

pub mod error;
pub mod handlers;
pub mod models;
pub mod state;
pub mod upload;

pub use state::AppState;

/// Build the HTTP router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    let mut app = Router::new()
        .route(
            "/extract-pdf-text",
            post(handlers::extract::extract),
        )
        .route("/list-files", get(handlers::files::list_files))
        .route("/get-file", get(handlers::files::get_file))
        .route("/view-file", get(handlers::files::view_file))
        .route("/create-file", post(handlers::files::create_file))
        .route("/undo-last-text", post(handlers::undo::undo_last_text))
        .route("/save-text", post(handlers::save::save_text));

    // Frontend assets, including index.html at "/"
    if let Some(dir) = &state.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(body_limit).with_state(state)
}
