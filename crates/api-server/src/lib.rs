//! HTTP surface for the assessment engine: `GET /health` and `POST /assess`.

pub mod assess_routes;
pub mod config;
pub mod error;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use assessment_core::Phrasebook;
use assessment_orchestrator::AssessmentOrchestrator;
use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, Method, Request},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

pub use config::{CorsOrigins, ServerConfig};
pub use error::AppError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Hardening headers for a JSON-only API. Assessments carry financial figures, so
/// nothing is cached.
const SECURITY_HEADERS: [(HeaderName, &str); 5] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (
        header::CONTENT_SECURITY_POLICY,
        "default-src 'none'; frame-ancestors 'none'",
    ),
    (header::REFERRER_POLICY, "no-referrer"),
    (header::CACHE_CONTROL, "no-store"),
];

/// Request id as text, for logs. `-` when the id layer did not run.
pub fn request_id_text(id: Option<&RequestId>) -> String {
    id.and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("-")
        .to_string()
}

/// Shared, read-only state. Cloned per request; everything inside is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AssessmentOrchestrator>,
    pub assessment_timeout: Duration,
}

impl AppState {
    /// Load parameters, benchmark table and phrasebook once and wire the orchestrator.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let params = config.load_params()?;
        let table = config.load_benchmarks()?;
        let phrasebook = Phrasebook::bundled().context("bundled phrasebook is invalid")?;

        for language in assessment_core::Language::ALL {
            let missing = phrasebook.missing_keys(language);
            if !missing.is_empty() {
                tracing::warn!(
                    "Phrasebook '{}' lacks {} keys, English will be used for them",
                    language.code(),
                    missing.len()
                );
            }
        }

        tracing::info!(
            "Benchmark table {} (published {}) with {} industries",
            table.version,
            table.published,
            table.industries.len()
        );

        let orchestrator =
            AssessmentOrchestrator::new(params, Arc::new(table), Arc::new(phrasebook))
                .with_language_policy(config.language_policy)
                .with_execution_mode(config.execution_mode);

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            assessment_timeout: config.assessment_timeout,
        })
    }
}

fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let allow_origin = match origins {
        CorsOrigins::Any => AllowOrigin::from(Any),
        CorsOrigins::List(list) => {
            AllowOrigin::list(list.iter().filter_map(|o| HeaderValue::from_str(o).ok()))
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Layers from the inside out: security headers, CORS, request id echo, trace span,
/// request id assignment. An incoming `x-request-id` is kept, otherwise a UUID v4 is minted.
pub fn build_router(state: AppState, cors: &CorsOrigins) -> Router {
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id_text(request.extensions().get::<RequestId>()),
        )
    });

    let router = SECURITY_HEADERS.into_iter().fold(
        assess_routes::assess_routes().with_state(state),
        |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::overriding(
                name,
                HeaderValue::from_static(value),
            ))
        },
    );

    router
        .layer(cors_layer(cors))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(trace)
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
}

pub async fn run_server() -> Result<()> {
    let config = ServerConfig::from_env()?;
    tracing::info!(
        "Starting assessment API on {} (timeout {:?}, language policy {:?}, execution {:?})",
        config.bind_addr,
        config.assessment_timeout,
        config.language_policy,
        config.execution_mode
    );

    let state = AppState::from_config(&config)?;
    let app = build_router(state, &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Assessment API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
