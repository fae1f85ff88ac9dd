//! Report proxy endpoint
//!
//! Accepts an instruction plus inline image parts, forwards them as a single
//! multimodal generation call and answers with either the one-candidate
//! success envelope or an [`ErrorEnvelope`](crate::wire::ErrorEnvelope).

pub mod error;
pub mod validate;

pub use error::ProxyError;
pub use validate::ReportRequest;

use crate::ai::{ContentGenerator, GeminiClient};
use crate::models::Config;
use crate::wire::GenerateContentResponse;
use crate::Result;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub const REPORT_PATH: &str = "/api/generate-report";

/// Immutable per-process context injected into every handler.
///
/// `generator` is `None` when no upstream credential was configured; every
/// report request is then answered with `ServerMisconfigured`.
#[derive(Clone)]
pub struct ProxyState {
    generator: Option<Arc<dyn ContentGenerator>>,
}

impl ProxyState {
    pub fn new(generator: Arc<dyn ContentGenerator>) -> Self {
        Self {
            generator: Some(generator),
        }
    }

    pub fn unconfigured() -> Self {
        Self { generator: None }
    }

    pub fn from_config(config: &Config) -> Self {
        match &config.gemini_api_key {
            Some(api_key) => {
                info!("Upstream provider: Gemini (model: {})", config.gemini_model);
                let client = GeminiClient::new(
                    api_key.clone(),
                    config.gemini_model.clone(),
                    config.upstream_timeout,
                )
                .with_base_url(config.gemini_base_url.clone());
                Self::new(Arc::new(client))
            }
            None => {
                warn!("GEMINI_API_KEY not set; report requests will fail until it is configured");
                Self::unconfigured()
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }
}

#[derive(Serialize)]
struct HealthCheckResponse {
    status: &'static str,
    upstream_configured: bool,
}

async fn health_check(State(state): State<ProxyState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "ok",
        upstream_configured: state.is_configured(),
    })
}

async fn generate_report(
    State(state): State<ProxyState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> std::result::Result<Json<GenerateContentResponse>, ProxyError> {
    let generator = state
        .generator
        .as_ref()
        .ok_or(ProxyError::ServerMisconfigured)?;

    let body = body.map_err(|e| ProxyError::BadRequest(Some(e.body_text())))?;
    let request = ReportRequest::from_body(&body)?;

    tracing::debug!(
        "Forwarding report request ({} image part(s), {} body bytes)",
        request.images.len(),
        body.len()
    );

    let text = generator.generate(&request.into_upstream()).await?;

    info!("Report generated ({} chars)", text.chars().count());
    Ok(Json(GenerateContentResponse::from_text(text)))
}

async fn method_not_allowed() -> ProxyError {
    ProxyError::MethodNotAllowed
}

async fn not_found() -> ProxyError {
    ProxyError::NotFound
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Build the proxy router.
///
/// OPTIONS requests are answered by the CORS layer with an empty 200 and
/// never reach a handler.
pub fn router(state: ProxyState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            REPORT_PATH,
            post(generate_report).fallback(method_not_allowed),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until the process is stopped.
pub async fn serve(config: &Config) -> Result<()> {
    let app = router(ProxyState::from_config(config), config.max_body_bytes);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("Report proxy listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
