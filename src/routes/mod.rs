//! Route modules for Docintel Server

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod health;
pub mod ocr;
pub mod sds;

/// Build the application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/health", health::router())
        .nest("/api/v1/health", health::router())
        .nest("/ocr", ocr::router())
        .nest("/api/v1/ocr", ocr::router())
        .nest("/verify-sds", sds::router())
        .nest("/api/v1/verify-sds", sds::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
