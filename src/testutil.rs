use crate::service::{serve, Metrics, Service};
use futures::{Future, FutureExt};
use std::net::{SocketAddr, TcpListener};
use std::panic::AssertUnwindSafe;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use url::Url;

#[macro_export]
macro_rules! assert_matches {
    ($expression:expr, $pattern:pat $( if $guard: expr )? $(,)?) => {
        match $expression {
            $pattern $( if $guard )? => (),
            o => ::core::panic!("match did not pass; got: {:?}", o)
        }
    }
}

pub async fn run_test<S, T, X, Y, Z>(
    setup: impl FnOnce() -> X,
    cleanup: impl FnOnce(T) -> Y,
    test: impl FnOnce(S) -> Z,
) where
    X: Future<Output = (S, T)>,
    Y: Future<Output = ()>,
    Z: Future<Output = ()>,
{
    // Setup
    let (test_ctx, teardown_ctx) = setup().await;

    // Test
    let fut = AssertUnwindSafe(test(test_ctx));
    let result = fut.catch_unwind().await;

    // Teardown
    cleanup(teardown_ctx).await;
    assert!(result.is_ok())
}

pub struct ServiceContext {
    pub service: Service,
    pub base_url: Url,
}

pub struct ServiceCleanup {
    shutdown_trigger: oneshot::Sender<()>,
    server_task: JoinHandle<anyhow::Result<()>>,
}

/// Starts the real server on an ephemeral local port, backed by a fresh
/// registry.
pub async fn service_setup() -> (ServiceContext, ServiceCleanup) {
    let service = Service::new(Metrics::new().expect("Could not create metrics"));

    let listener = TcpListener::bind("127.0.0.1:0").expect("Could not bind test listener");
    let addr: SocketAddr = listener.local_addr().unwrap();

    let (shutdown_trigger, shutdown_signal) = oneshot::channel::<()>();
    let server_task = tokio::spawn(serve(listener, service.clone(), async move {
        let _ = shutdown_signal.await;
    }));

    let base_url = Url::parse(&format!("http://{addr}")).unwrap();

    let service_context = ServiceContext { service, base_url };

    let service_cleanup = ServiceCleanup {
        shutdown_trigger,
        server_task,
    };

    (service_context, service_cleanup)
}

pub async fn service_cleanup(context: ServiceCleanup) {
    let _ = context.shutdown_trigger.send(());

    context
        .server_task
        .await
        .expect("Server task panicked")
        .expect("Server exited with an error");
}

/// Looks up the value of a single sample in a text exposition body.
///
/// `series` is the metric name plus its rendered label set, exactly as it
/// appears in front of the value.
pub fn sample_value(exposition: &str, series: &str) -> Option<f64> {
    exposition
        .lines()
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| line.strip_prefix(series)?.strip_prefix(' '))
        .and_then(|value| value.trim().parse().ok())
}
