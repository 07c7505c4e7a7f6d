mod errors;
pub mod handlers;

pub use errors::{MetricsError, MetricsHandlerError};

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, Opts, Registry, TextEncoder};
use std::time::Duration;

pub const REQUEST_DURATION_NAME: &str = "req_res_time";
pub const REQUEST_COUNT_NAME: &str = "total_req";

/// Upper bounds, in milliseconds, of the request duration buckets.
pub const REQUEST_DURATION_BUCKETS: [f64; 11] = [
    1.0, 100.0, 200.0, 400.0, 500.0, 700.0, 900.0, 1100.0, 1400.0, 1600.0, 2000.0,
];

const REQUEST_DURATION_LABELS: [&str; 3] = ["method", "route", "status_code"];

/// Process-wide request metrics.
///
/// Owns its own [`Registry`] rather than relying on the prometheus default
/// registry, so every instance starts from zero and two instances never
/// share samples.
pub struct Metrics {
    registry: Registry,
    request_duration: HistogramVec,
    request_count: IntCounter,
}

impl Metrics {
    /// Creates the registry and registers the request histogram, the request
    /// counter and (where the platform supports it) the process collector.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                REQUEST_DURATION_NAME,
                "This tells how much time tooks in req and res",
            )
            .buckets(REQUEST_DURATION_BUCKETS.to_vec()),
            &REQUEST_DURATION_LABELS,
        )?;

        let request_count = IntCounter::with_opts(Opts::new(
            REQUEST_COUNT_NAME,
            "it will display all no. of requests",
        ))?;

        registry.register(Box::new(request_duration.clone()))?;
        registry.register(Box::new(request_count.clone()))?;
        register_process_collector(&registry)?;

        Ok(Self {
            registry,
            request_duration,
            request_count,
        })
    }

    /// Records one completed request.
    ///
    /// The counter is incremented before the histogram lookup, so a request
    /// is always counted even when its labels are rejected.
    pub fn observe_request(
        &self,
        method: &str,
        route: &str,
        status_code: u16,
        elapsed: Duration,
    ) -> Result<(), MetricsError> {
        self.request_count.inc();

        let status_code = status_code.to_string();
        let histogram = self
            .request_duration
            .get_metric_with_label_values(&[method, route, status_code.as_str()])
            .map_err(|err| MetricsError::Label(err.to_string()))?;
        histogram.observe(elapsed.as_nanos() as f64 / 1_000_000.0);

        Ok(())
    }

    /// Renders every registered metric family in the text exposition format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|err| MetricsError::Encoding(err.to_string()))?;

        Ok(String::from_utf8(buffer)?)
    }

    /// The `Content-Type` matching the output of [`Metrics::encode`].
    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }

    #[cfg(test)]
    pub fn request_count(&self) -> u64 {
        self.request_count.get()
    }
}

#[cfg(target_os = "linux")]
fn register_process_collector(registry: &Registry) -> Result<(), prometheus::Error> {
    use prometheus::process_collector::ProcessCollector;

    registry.register(Box::new(ProcessCollector::for_self()))
}

#[cfg(not(target_os = "linux"))]
fn register_process_collector(_registry: &Registry) -> Result<(), prometheus::Error> {
    Ok(())
}
