use std::sync::Arc;
use tokio::sync::mpsc;

use crate::cache::AnalysisCache;
use crate::models::AnalysisJob;
use crate::rate_limit::RateLimiter;

// app's shared state, handed to every handler
pub struct AppState {
    pub cache: Arc<AnalysisCache>,
    pub rate_limiter: RateLimiter,
    pub jobs_tx: mpsc::Sender<AnalysisJob>,
}

impl AppState {
    pub fn new(
        cache: Arc<AnalysisCache>,
        rate_limiter: RateLimiter,
        jobs_tx: mpsc::Sender<AnalysisJob>,
    ) -> Self {
        Self {
            cache,
            rate_limiter,
            jobs_tx,
        }
    }
}
