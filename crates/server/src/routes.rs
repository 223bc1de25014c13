//! Route configuration.

use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/api/best-sellers", get(handlers::best_sellers))
        .route("/api/books/isbn/{isbn}", get(handlers::books_by_isbn))
        // Health check (unauthenticated for load balancers/k8s probes)
        .route("/up", get(handlers::health_check));

    // Unauthenticated; see crate::metrics.
    if state.config.server.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
