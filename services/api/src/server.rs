use crate::cli::ServeArgs;
use crate::infra::{load_dataset, AppState, InMemoryMatchBackend};
use crate::routes::with_match_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use volunteer_match::config::AppConfig;
use volunteer_match::error::AppError;
use volunteer_match::matching::MatchService;
use volunteer_match::telemetry;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(dataset) = args.dataset.take() {
        config.data.dataset = Some(dataset);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let dataset = load_dataset(config.data.dataset.as_deref())?;
    info!(
        opportunities = dataset.opportunities.len(),
        profiles = dataset.profiles.len(),
        source = ?config.data.dataset,
        "match dataset loaded"
    );
    let backend = Arc::new(InMemoryMatchBackend::new(dataset));
    let match_service = Arc::new(MatchService::new(backend.clone(), backend));

    let app = with_match_routes(match_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "volunteer match service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
