use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

// Failures talking to the AI model
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    Request(reqwest::Error),

    #[error("Model returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Model returned no content")]
    EmptyResponse,

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

// Failures refreshing a session token
#[derive(Debug, Error)]
pub enum AuthApiError {
    #[error("Request failed: {0}")]
    Request(reqwest::Error),

    #[error("Refresh rejected with status {0}")]
    Rejected(u16),
}

// reqwest errors carry the request URL; keep it out of logs and responses
impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Request(e.without_url())
    }
}

impl From<reqwest::Error> for AuthApiError {
    fn from(e: reqwest::Error) -> Self {
        AuthApiError::Request(e.without_url())
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limit exceeded. Try again later.")]
    RateLimited,

    #[error("Failed to queue request")]
    QueueClosed,

    #[error("Worker failed to respond")]
    WorkerGone,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Metrics encoding failed: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::QueueClosed | GatewayError::WorkerGone => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Provider(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_to_http_status() {
        assert_eq!(GatewayError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            GatewayError::InvalidRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::Provider(ProviderError::EmptyResponse).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(GatewayError::WorkerGone.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
