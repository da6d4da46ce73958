use axum::extract::{ConnectInfo, State};
use axum::http::{Extensions, HeaderMap};
use axum::Json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::debug;

use crate::cache::make_cache_key;
use crate::error::GatewayError;
use crate::metrics::{ANALYZE_LATENCY, ANALYZE_REQUESTS};
use crate::models::{AnalysisJob, AnalyzeRequest, AnalyzeResponse};
use crate::state::AppState;

/// Rate limit bucket for a request: the first `X-Forwarded-For` hop when
/// behind a proxy, else the peer address, else one shared bucket.
fn client_key(headers: &HeaderMap, extensions: &Extensions) -> String {
    if let Some(client) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return client.to_string();
    }
    match extensions.get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => addr.ip().to_string(),
        None => "global".to_string(),
    }
}

pub async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    extensions: Extensions,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, GatewayError> {
    ANALYZE_REQUESTS.inc();

    let client = client_key(&headers, &extensions);
    if !state.rate_limiter.check(&client) {
        debug!(%client, "Rate limited");
        return Err(GatewayError::RateLimited);
    }

    let source = payload.fingerprint_source().ok_or_else(|| {
        GatewayError::InvalidRequest("either text or documentId is required".to_string())
    })?;
    let cache_key = make_cache_key(source, &payload.options());
    debug!(key = %cache_key, marketing = payload.marketing, "Queueing analysis");

    let start_time = Instant::now();
    let (response_tx, response_rx) = oneshot::channel();

    let job = AnalysisJob {
        request: payload,
        cache_key,
        response_tx,
    };

    state
        .jobs_tx
        .send(job)
        .await
        .map_err(|_| GatewayError::QueueClosed)?;

    let result = response_rx.await.map_err(|_| GatewayError::WorkerGone)?;

    ANALYZE_LATENCY.observe(start_time.elapsed().as_secs_f64());

    Ok(Json(result?))
}
