//! Axum router construction for the Archipel API.
//!
//! Assembles all routes into a single [`Router`] with CORS middleware
//! enabled for browser clients and request tracing.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// See [`handlers`] for the endpoint table. CORS allows any origin, as
/// the game client is served from elsewhere.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Polling
        .route("/api/state", get(handlers::get_state))
        .route(
            "/api/players/{id}/notifications",
            get(handlers::list_notifications),
        )
        .route(
            "/api/players/{id}/notifications/unread",
            get(handlers::unread_count),
        )
        .route("/api/players/{id}/transports", get(handlers::list_transports))
        .route("/api/islands/{id}/sites/{resource}", get(handlers::get_site))
        // Accounts and cities
        .route("/api/join", post(handlers::join))
        .route("/api/cities/claim", post(handlers::claim_city))
        .route("/api/cities/rename", post(handlers::rename_city))
        .route("/api/cities/tax-rate", post(handlers::set_tax_rate))
        .route("/api/cities/windmill", post(handlers::set_windmill_multiplier))
        .route("/api/cities/cure-plague", post(handlers::cure_plague))
        // Buildings and workers
        .route("/api/buildings/build", post(handlers::build))
        .route("/api/buildings/destroy", post(handlers::destroy))
        .route("/api/buildings/complete", post(handlers::complete_instantly))
        .route("/api/workers", post(handlers::assign_workers))
        // Sites, transports, research
        .route("/api/sites/donate", post(handlers::donate))
        .route("/api/transports", post(handlers::create_transport))
        .route("/api/transports/cancel", post(handlers::cancel_transport))
        .route("/api/research", post(handlers::unlock_research))
        // Player account
        .route("/api/ships", post(handlers::buy_ship))
        .route("/api/diamonds", post(handlers::add_diamonds))
        .route("/api/notifications", post(handlers::notify))
        .route(
            "/api/notifications/read",
            post(handlers::mark_notifications_read),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
