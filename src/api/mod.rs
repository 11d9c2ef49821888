use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::db::Repository;

pub mod handlers;

pub struct AppState {
    pub repository: Repository,
    pub page_size: u64,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/api/news/", get(handlers::list_news))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}
