
use crate::service::Service;
use axum::extract::State;
use axum::http::{Request, Uri};
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;
use tracing::warn;

/// Records the latency and outcome of every request passing through the
/// router, including 404s and handler panics.
///
/// The `route` label is the raw request target (path and query string), not
/// the matched route template. Every distinct URL therefore gets its own
/// histogram series.
pub async fn record_response_time<B>(
    State(service): State<Service>,
    request: Request<B>,
    next: Next<B>,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = raw_target(request.uri());

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    let status_code = response.status().as_u16();
    if let Err(err) = service
        .metrics()
        .observe_request(&method, &route, status_code, elapsed)
    {
        // Never let bookkeeping affect the response.
        warn!(%err, %method, %route, status_code, "Unable to record request metrics");
    }

    response
}

fn raw_target(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|path_and_query| path_and_query.as_str())
        .unwrap_or_else(|| uri.path())
        .to_owned()
}
