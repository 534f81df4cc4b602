use std::net::SocketAddr;
use std::sync::Once;

use autometrics::prometheus_exporter;
use lazy_static::lazy_static;
use prometheus::IntCounterVec;
use prometheus::IntGauge;
use prometheus::Opts;
use prometheus::Registry;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use warp::Filter;
use warp::Rejection;
use warp::Reply;

use crate::Result;
use crate::SystemError;


lazy_static! {
    pub static ref FAULT_POINT_HITS: IntCounterVec = IntCounterVec::new(
        Opts::new("fault_point_hits", "Times an activated fault point was reached"),
        &["point"]
    )
    .expect("metric can not be created");

    pub static ref FAULTS_TRIGGERED: IntCounterVec = IntCounterVec::new(
        Opts::new("faults_triggered", "Times a fault point fired inside its window"),
        &["point", "kind"]
    )
    .expect("metric can not be created");

    pub static ref ACTIVE_FAULT_POINTS: IntGauge =
        IntGauge::new("active_fault_points", "Number of currently activated fault points")
            .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

static REGISTER: Once = Once::new();

fn register_custom_metrics() {
    REGISTER.call_once(|| {
        REGISTRY
            .register(Box::new(FAULT_POINT_HITS.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(FAULTS_TRIGGERED.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(ACTIVE_FAULT_POINTS.clone()))
            .expect("collector can be registered");
    });
}

/// Binds the `/metrics` endpoint and returns the bound address together with
/// the server future. The future completes once `shutdown_signal` fires.
pub fn bind_server(
    addr: SocketAddr,
    mut shutdown_signal: watch::Receiver<()>,
) -> Result<(SocketAddr, impl std::future::Future<Output = ()>)> {
    register_custom_metrics();

    let metrics_route = warp::path!("metrics").and(warp::get()).and_then(metrics_handler);

    warp::serve(metrics_route)
        .try_bind_with_graceful_shutdown(addr, async move {
            let _ = shutdown_signal.changed().await;
        })
        .map_err(|e| {
            SystemError::ServerBind {
                service: "metrics",
                addr,
                reason: e.to_string(),
            }
            .into()
        })
}

pub async fn start_server(
    addr: SocketAddr,
    shutdown_signal: watch::Receiver<()>,
) {
    match bind_server(addr, shutdown_signal) {
        Ok((bound, server)) => {
            info!("metrics server listening on {}", bound);
            server.await;
        }
        Err(e) => error!("metrics server failed to start: {}", e),
    }
}

async fn metrics_handler() -> std::result::Result<impl Reply, Rejection> {
    Ok(gather_metrics())
}

/// Text exposition of the crate registry, the default prometheus registry
/// and the autometrics exporter.
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    register_custom_metrics();
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    }
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        error!("could not encode prometheus metrics: {}", e);
    }
    let mut res = String::from_utf8(buffer).unwrap_or_else(|e| {
        error!("metrics could not be from_utf8'd: {}", e);
        String::default()
    });

    res.push_str(&get_metrics_body());
    res
}

/// Export autometrics function metrics for Prometheus to scrape
pub fn get_metrics_body() -> String {
    prometheus_exporter::encode_http_response().into_body()
}
