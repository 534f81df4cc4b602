//! Standalone fault injector process.
//!
//! Loads `FaultInjectorConfig`, arms the startup faults, serves the
//! `/inject_fault` control API and runs the instrumented heartbeat until
//! SIGINT/SIGTERM.

use std::path::Path;

use ha_fault_injector::utils::file_io;
use ha_fault_injector::Error;
use ha_fault_injector::FaultInjectorConfig;
use ha_fault_injector::NodeBuilder;
use ha_fault_injector::Result;
use ha_fault_injector::SystemError;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let config = FaultInjectorConfig::new()?.validate()?;
    let _guard = init_fault_log(&config.node.name, &config.node.log_dir)?;

    let (stop_tx, stop_rx) = watch::channel(());
    let member = config.node.name.clone();

    let builder = NodeBuilder::new(config, stop_rx.clone())
        .build()?
        .start_metrics_server(stop_rx)
        .start_control_server()?;
    match builder.control_address() {
        Some(addr) => info!("[{}] accepting fault commands on http://{}/inject_fault", member, addr),
        None => info!("[{}] control API disabled; startup faults only", member),
    }
    let node = builder.ready()?;

    let armed = node.registry.list_active();
    if !armed.is_empty() {
        info!("[{}] armed at startup: {:?}", member, armed);
    }

    tokio::spawn(async move {
        if let Err(e) = forward_stop_signal(stop_tx).await {
            error!("stop signal not delivered: {}", e);
        }
    });

    node.run().await;
    Ok(())
}

/// Waits for SIGINT, SIGTERM or Ctrl-C and notifies every server and loop.
async fn forward_stop_signal(stop_tx: watch::Sender<()>) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let received = tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = tokio::signal::ctrl_c() => "Ctrl-C",
    };
    info!("{} received, stopping", received);

    stop_tx
        .send(())
        .map_err(|e| Error::System(SystemError::SignalSenderClosed(e.to_string())))
}

/// Routes `tracing` output to `{log_dir}/{member}/fault.log`, filtered by
/// `RUST_LOG`. Keep the guard alive for the life of the process.
fn init_fault_log(
    member: &str,
    log_dir: &Path,
) -> Result<WorkerGuard> {
    let path = log_dir.join(member).join("fault.log");
    let log_file = file_io::open_file_for_append(&path)?;

    let (writer, guard) = tracing_appender::non_blocking(log_file);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_filter(EnvFilter::from_default_env()),
        )
        .init();

    Ok(guard)
}
