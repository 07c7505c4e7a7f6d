#![forbid(unsafe_code)]

#[cfg(test)]
#[macro_use]
mod testutil;

mod service;

use anyhow::{bail, Context, Result};
use clap::Parser;
use opentelemetry::sdk::{trace, Resource};
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use service::{Metrics, Service};
use std::convert::Infallible;
use std::io;
use std::net::{IpAddr, SocketAddr, TcpListener};
use std::process::ExitCode;
use tokio::select;
use tracing::{error, info};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};
use url::Url;

const DEFAULT_PORT: u16 = 8000;

/// HTTP server exposing request latency and count metrics
#[derive(Parser)]
#[clap(
    name = "req-metrics",
    author = "Team Fiberplane",
    version = clap::crate_version!()
)]
struct CliArguments {
    /// Log using JSON.
    #[clap(long, env = "LOG_JSON")]
    json: bool,

    /// Enable tracing support.
    ///
    /// Use `--otlp-endpoint` to specify where the traces should be sent.
    #[clap(long, env)]
    tracing: bool,

    /// Endpoint of the OTLP collector.
    #[clap(long, env, default_value = "http://localhost:4317")]
    otlp_endpoint: Url,

    #[clap(flatten)]
    serve_args: ServeArguments,
}

#[derive(Parser)]
struct ServeArguments {
    /// Server port number. Anything that is not a valid, non-zero port
    /// falls back to 8000.
    #[clap(long, short, env, default_value_t = DEFAULT_PORT, value_parser = parse_port)]
    port: u16,

    /// Hostname to listen on
    #[clap(long, short = 'H', env, default_value = "0.0.0.0")]
    listen_host: IpAddr,
}

fn parse_port(value: &str) -> Result<u16, Infallible> {
    Ok(value
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|port| *port != 0)
        .unwrap_or(DEFAULT_PORT))
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let args = CliArguments::parse();

    let result = initialize_logger(&args);
    if let Err(err) = result {
        eprintln!("Unable to initialize logger: {err:#}");
        return ExitCode::FAILURE;
    }

    let result = handle_serve(args.serve_args).await;

    if let Err(err) = result {
        error!("Command executed unsuccessfully: {err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn initialize_logger(args: &CliArguments) -> Result<()> {
    // The filter layer controls which log levels to display.
    let filter_layer = EnvFilter::from_default_env();

    // The log layer controls the output of log events to stderr. Depending on the
    // `json` flag, it will either be human readable or json encoded.
    let log_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);
    let log_layer = if args.json {
        log_layer.json().boxed()
    } else {
        log_layer.boxed()
    };

    // The trace layer will send traces to the configured tracing backend
    // depending on the `tracing` flag.
    let trace_layer = if args.tracing {
        // This tracer is responsible for sending the actual traces.
        let tracer =
            opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(
                    opentelemetry_otlp::new_exporter()
                        .tonic()
                        .with_endpoint(args.otlp_endpoint.to_string()),
                )
                .with_trace_config(trace::config().with_resource(Resource::new(vec![
                    KeyValue::new("service.name", "req-metrics"),
                ])))
                .install_batch(opentelemetry::runtime::Tokio)
                .context("unable to install tracer")?;

        // This layer will take the traces from the `tracing` crate and send
        // them to the tracer specified above.
        Some(OpenTelemetryLayer::new(tracer))
    } else {
        None
    };

    Registry::default()
        .with(filter_layer)
        .with(log_layer)
        .with(trace_layer)
        .try_init()
        .context("unable to initialize logger")?;

    Ok(())
}

async fn handle_serve(args: ServeArguments) -> Result<()> {
    let metrics = Metrics::new().context("unable to register metrics")?;
    let service = Service::new(metrics);

    let addr = SocketAddr::from((args.listen_host, args.port));
    let listener = TcpListener::bind(addr).with_context(|| format!("unable to bind {addr}"))?;

    let commit = option_env!("GITHUB_SHA").unwrap_or("unknown");

    info!(
        port = ?args.port,
        listen_host = ?args.listen_host,
        ?commit,
        "Server started at PORT:{}",
        args.port
    );

    let (shutdown_trigger, mut shutdown_signal) = tokio::sync::mpsc::channel::<()>(1);
    let mut server_task = tokio::spawn(service::serve(listener, service, async move {
        shutdown_signal.recv().await;
        info!("graceful shutdown request received");
    }));

    // Graceful shutdown detection
    select! {
        task_result = &mut server_task => {
            // The server only stops on its own when something went wrong.
            return match task_result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(server_error)) => Err(server_error),
                Err(join_error) => bail!("server task failed: {join_error}"),
            };
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(err) = signal {
                // we also shut down in case of error
                error!(%err, "Unable to listen for shutdown signal");
            }
        }
    }

    shutdown_trigger
        .send(())
        .await
        .context("could not trigger shutdown signal")?;

    select! {
        _ = tokio::signal::ctrl_c() => {
            bail!("forced shutdown from additional signal")
        }
        task_result = server_task => {
            match task_result {
                Ok(Ok(())) => info!("shutdown complete"),
                Ok(Err(server_error)) => {
                    error!(?server_error, "server error during shutdown");
                    bail!("server error during shutdown: {server_error}")
                }
                Err(join_error) => {
                    error!(?join_error, "server task failed during shutdown");
                    bail!("server task failed during shutdown: {join_error}")
                }
            };
            Ok(())
        }
    }
}
