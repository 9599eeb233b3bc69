use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Extension, Router};
use tower_http::{catch_panic::CatchPanicLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    handlers::posts::posts_handler,
    middleware::{configure_cors, handle_panic},
    AppState,
};

/// Two images per post travel in one multipart body.
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

pub fn create_routes(app_state: Arc<AppState>) -> Router {
    let assets = ServeDir::new(&app_state.config.assets_dir);

    Router::new()
        .nest("/posts", posts_handler())
        .nest_service("/assets", assets)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state))
        .layer(configure_cors())
        .layer(CatchPanicLayer::custom(handle_panic))
}
