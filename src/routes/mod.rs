//! HTML view routes.

pub mod pages;

use axum::routing::get;
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::index))
        .route("/summary", get(pages::summary))
        .route("/proposal", get(pages::proposal))
}
