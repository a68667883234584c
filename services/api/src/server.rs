use crate::cli::ServeArgs;
use crate::infra::{load_catalog, AppState, ConfiguredStore};
use crate::routes::with_assessment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use sdgx::assessment::AssessmentSession;
use sdgx::config::AppConfig;
use sdgx::error::AppError;
use sdgx::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

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
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let catalog = Arc::new(load_catalog(&config.assessment)?);
    let store = Arc::new(ConfiguredStore::open(&config.storage)?);
    let session = AssessmentSession::restore(catalog, store, config.assessment.gate_policy());

    let app = with_assessment_routes(Arc::new(Mutex::new(session)))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "sdg-x assessment service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
