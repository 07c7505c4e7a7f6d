use super::{StatusMessage, SLOW_RESPONSE_DELAY};
use axum::Json;
use tracing::instrument;

#[instrument]
pub async fn status_get() -> Json<StatusMessage> {
    Json(StatusMessage::up())
}

/// Answers like `/` after [`SLOW_RESPONSE_DELAY`]. The delay is a timer
/// await, so other requests keep being served meanwhile.
#[instrument]
pub async fn slow_get() -> Json<StatusMessage> {
    tokio::time::sleep(SLOW_RESPONSE_DELAY).await;

    Json(StatusMessage::up())
}
