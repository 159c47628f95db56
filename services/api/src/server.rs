use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_availability_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use siteline::availability::{AvailabilityMonitor, SystemClock};
use siteline::config::AppConfig;
use siteline::error::AppError;
use siteline::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let schedule = config.availability.schedule.clone();
    if schedule.is_always_closed() {
        warn!("weekly schedule has no open days; availability will always report closed");
    }

    let monitor = Arc::new(AvailabilityMonitor::spawn(
        Arc::new(SystemClock),
        schedule.clone(),
        config.availability.poll_interval,
    ));
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        availability: monitor.clone(),
        schedule: Arc::new(schedule),
    };

    let app = with_availability_routes()
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        poll_secs = config.availability.poll_interval.as_secs(),
        lead_endpoint = %config.leads.endpoint,
        "siteline api ready"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    readiness_flag.store(false, Ordering::Release);
    monitor.shutdown();
    info!("siteline api stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
