use super::metrics::handlers::metrics_get;
use super::status::handlers::{slow_get, status_get};
use super::timing::record_response_time;
use crate::service::Service;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{middleware, Router};
use tower_http::catch_panic::CatchPanicLayer;

pub fn create_router(service: Service) -> Router<()> {
    let router = Router::new()
        .route("/", get(status_get))
        .route("/metrics", get(metrics_get))
        .route("/slow", get(slow_get))
        .fallback(|| async { StatusCode::NOT_FOUND })
        .layer(CatchPanicLayer::new())
        // Added last so it wraps everything above, including panics turned
        // into 500s and the fallback.
        .layer(middleware::from_fn_with_state(
            service.clone(),
            record_response_time,
        ));

    router.with_state(service)
}
