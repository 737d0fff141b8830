use anyhow::Context;
use jobflow::cancellation::CancellationToken;
use jobflow::config::{load, validate_config};
use jobflow::generators::default_generators;
use jobflow::handlers::default_registry;
use jobflow::logging;
use jobflow::pipeline::FanOutScheduler;
use jobflow::telemetry::{TelemetrySink, TracingTelemetry};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("jobflow error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    logging::init_logging()?;

    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let (config, source) = load(path.as_deref()).context("loading configuration")?;
    let generators = default_generators();
    validate_config(&config, Some(&generators)).context("validating configuration")?;
    info!(source = %source, roots = config.root_count(), "Loaded configuration");

    let cancel = Arc::new(CancellationToken::new());
    spawn_signal_listener(Arc::clone(&cancel));

    let telemetry = Arc::new(TracingTelemetry::default());
    let scheduler = FanOutScheduler::new(
        default_registry(),
        generators,
        Arc::clone(&telemetry) as Arc<dyn TelemetrySink>,
    );
    let summary = scheduler.run(&config, cancel).await;

    info!(
        success_count = summary.success_count,
        failure_count = summary.failure_count,
        "All tasks completed"
    );
    let metrics = telemetry
        .counters()
        .to_prometheus_text()
        .context("encoding metrics")?;
    print!("{metrics}");
    Ok(())
}

/// Cancels the run on Ctrl-C (and SIGTERM on unix).
fn spawn_signal_listener(cancel: Arc<CancellationToken>) {
    tokio::spawn(async move {
        let reason = wait_for_signal().await;
        warn!(reason, "Shutdown requested, cancelling outstanding work");
        cancel.cancel(reason);
    });
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => tokio::select! {
            () = ctrl_c() => "interrupt",
            _ = sigterm.recv() => "terminate",
        },
        Err(err) => {
            warn!(error = %err, "Cannot listen for SIGTERM");
            ctrl_c().await;
            "interrupt"
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    ctrl_c().await;
    "interrupt"
}

/// Completes on Ctrl-C. Never completes if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
