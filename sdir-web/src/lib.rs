//! sdir-web: student directory web service
//!
//! HTTP surface over the directory engines in sdir-common. Registration,
//! browsing, filtered search, heuristic match ranking, and photo-based
//! lookup; records and identities live in external managed backends.

pub mod api;
pub mod error;
pub mod services;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use sdir_common::events::IdentityBus;
use sdir_common::MatchRanker;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::face::FaceClient;
use crate::services::identity::IdentityProvider;
use crate::services::record_store::RecordStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub identity: Arc<IdentityProvider>,
    pub face: Option<Arc<FaceClient>>,
    pub identity_bus: IdentityBus,
    pub ranker: Arc<MatchRanker>,
}

impl AppState {
    pub fn new(
        store: RecordStore,
        identity: IdentityProvider,
        face: Option<FaceClient>,
    ) -> Self {
        Self {
            store: Arc::new(store),
            identity: Arc::new(identity),
            face: face.map(Arc::new),
            identity_bus: IdentityBus::new(),
            ranker: Arc::new(MatchRanker::new()),
        }
    }
}

/// Build the router with all endpoints
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Root UI
        .route("/", get(api::ui::serve_ui))
        // Health check
        .route("/health", get(api::health::health_check))
        // Identity state events (SSE)
        .route("/api/events", get(api::sse::identity_events))
        // Authentication
        .route("/api/auth/register", post(api::auth::register))
        .route("/api/auth/login", post(api::auth::login))
        .route("/api/auth/logout", post(api::auth::logout))
        .route(
            "/api/auth/me",
            get(api::auth::me).delete(api::auth::delete_account),
        )
        // Student records
        .route(
            "/api/students",
            get(api::students::list_students).post(api::students::create_student),
        )
        .route(
            "/api/students/:id",
            get(api::students::get_student)
                .put(api::students::update_student)
                .delete(api::students::delete_student),
        )
        // Search
        .route("/api/search", post(api::search::search))
        .route("/api/search/ai", post(api::ai_search::ai_search))
        .route("/api/search/photo", post(api::face_search::photo_search))
        .route(
            "/api/search/photo/status",
            get(api::face_search::photo_search_status),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
