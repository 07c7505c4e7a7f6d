mod metrics;
mod status;
mod timing;

pub mod router;


use anyhow::{Context, Result};
use std::future::Future;
use std::net::TcpListener;
use std::sync::Arc;

pub use metrics::Metrics;

/// Application context handed to the router as axum state.
///
/// Built once at startup; cloning only bumps reference counts.
#[derive(Clone)]
pub struct Service {
    metrics: Arc<Metrics>,
}

impl Service {
    pub fn new(metrics: Metrics) -> Self {
        Self {
            metrics: Arc::new(metrics),
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Serves the application on `listener` until `shutdown` resolves, then
/// waits for in-flight requests to finish.
pub async fn serve<F>(listener: TcpListener, service: Service, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router::create_router(service);

    axum::Server::from_tcp(listener)
        .context("unable to use listener")?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .context("server error")?;

    Ok(())
}
