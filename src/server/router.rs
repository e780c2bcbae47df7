use axum::{routing::get, routing::post, Router};
use tower_http::trace::TraceLayer;

use crate::server::{handlers, AppState};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::available_areas))
        .route("/area/{area_id}", get(handlers::area))
        .route("/execute", post(handlers::execute))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
