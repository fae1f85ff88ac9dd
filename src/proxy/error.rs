use crate::wire::ErrorEnvelope;
use crate::Error;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

pub const METHOD_NOT_ALLOWED: &str = "Method Not Allowed";
pub const NOT_FOUND: &str = "Not Found";
pub const SERVER_MISCONFIGURED: &str = "Configuración del servidor incompleta.";
pub const INVALID_BODY: &str = "El cuerpo de la solicitud es inválido.";
pub const UPSTREAM_FAILURE: &str = "Error al procesar la solicitud de IA.";

pub const UPSTREAM_GENERIC_DETAILS: &str = "La IA no pudo procesar la solicitud.";
pub const UPSTREAM_EMPTY_DETAILS: &str =
    "La IA respondió, pero el formato del texto no es el esperado.";
pub const UPSTREAM_TIMEOUT_DETAILS: &str = "La IA tardó demasiado en responder.";

/// Every way a report request can be rejected or fail.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("no such route")]
    NotFound,

    #[error("server credential not configured")]
    ServerMisconfigured,

    #[error("malformed request body")]
    BadRequest(Option<String>),

    #[error("upstream failure: {0}")]
    UpstreamFailure(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::NotFound => StatusCode::NOT_FOUND,
            ProxyError::ServerMisconfigured => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        match self {
            ProxyError::MethodNotAllowed => ErrorEnvelope::new(METHOD_NOT_ALLOWED),
            ProxyError::NotFound => ErrorEnvelope::new(NOT_FOUND),
            ProxyError::ServerMisconfigured => ErrorEnvelope::new(SERVER_MISCONFIGURED),
            ProxyError::BadRequest(None) => ErrorEnvelope::new(INVALID_BODY),
            ProxyError::BadRequest(Some(details)) => {
                ErrorEnvelope::new(INVALID_BODY).with_details(details.clone())
            }
            ProxyError::UpstreamFailure(details) => {
                ErrorEnvelope::new(UPSTREAM_FAILURE).with_details(details.clone())
            }
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match &self {
            ProxyError::ServerMisconfigured => {
                tracing::error!("GEMINI_API_KEY is not configured; rejecting report request")
            }
            ProxyError::UpstreamFailure(details) => {
                tracing::error!("Report generation failed: {}", details)
            }
            ProxyError::BadRequest(details) => {
                tracing::warn!("Rejected malformed report request: {:?}", details)
            }
            ProxyError::MethodNotAllowed | ProxyError::NotFound => {}
        }

        (self.status(), Json(self.envelope())).into_response()
    }
}

impl From<Error> for ProxyError {
    fn from(e: Error) -> Self {
        let details = match e {
            Error::Upstream(message) => message,
            Error::UpstreamStatus(_) => UPSTREAM_GENERIC_DETAILS.to_string(),
            Error::EmptyCompletion => UPSTREAM_EMPTY_DETAILS.to_string(),
            Error::Http(e) if e.is_timeout() => {
                tracing::error!("Upstream request timed out: {}", e);
                UPSTREAM_TIMEOUT_DETAILS.to_string()
            }
            // Transport and decoding failures carry URLs and internals.
            other => {
                tracing::error!("Upstream call failed: {}", other);
                UPSTREAM_GENERIC_DETAILS.to_string()
            }
        };
        ProxyError::UpstreamFailure(details)
    }
}
