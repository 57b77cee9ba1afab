//! Embedded web UI

use axum::response::Html;

/// GET / - serve the single-page UI
pub async fn serve_ui() -> Html<&'static str> {
    Html(include_str!("../ui/index.html"))
}
