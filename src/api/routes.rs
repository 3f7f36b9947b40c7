use crate::api::{callback, handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the relay router
pub fn build_router(state: AppState, metrics_enabled: bool) -> Router {
    // Leave headroom over the enqueue deadline so the handler answers first.
    let timeout = TimeoutLayer::new(state.request_timeout + std::time::Duration::from_secs(1));

    let mut router = Router::new()
        .route("/healthz", get(handlers::health_check))
        // Alertmanager webhook ingress
        .route("/lark/webhook", post(handlers::receive_webhook))
        // Card interaction callbacks
        .route("/event/callback", post(callback::handle_callback));

    if metrics_enabled {
        router = router.route("/metrics", get(handlers::metrics));
    }

    router
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(timeout)
        .layer(CorsLayer::permissive())
}
