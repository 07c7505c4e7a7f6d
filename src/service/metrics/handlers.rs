use super::MetricsHandlerError;
use crate::service::Service;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use tracing::instrument;

#[instrument(err, skip(service))]
pub async fn metrics_get(
    State(service): State<Service>,
) -> Result<impl IntoResponse, MetricsHandlerError> {
    let body = service.metrics().encode()?;

    Ok(([(CONTENT_TYPE, service.metrics().content_type())], body))
}
