use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cache::AnalysisCache;
use crate::metrics::PROVIDER_FAILURES;
use crate::models::{AnalysisJob, AnalysisResult, AnalyzeResponse};
use crate::provider::ComplianceModel;

// Processes queued analyses one by one. Because jobs are sequential, a
// request queued behind an identical one is answered from the cache.
pub async fn analysis_worker(
    mut rx: mpsc::Receiver<AnalysisJob>,
    model: Arc<dyn ComplianceModel>,
    cache: Arc<AnalysisCache>,
) {
    info!("Analysis worker started - processing requests sequentially");

    while let Some(job) = rx.recv().await {
        let AnalysisJob {
            request,
            cache_key,
            response_tx,
        } = job;

        // check cache first
        if let Some(value) = cache.get(&cache_key) {
            match serde_json::from_value::<AnalysisResult>(value) {
                Ok(result) => {
                    debug!(key = %cache_key, "Cache HIT");
                    let _ = response_tx.send(Ok(AnalyzeResponse {
                        cache_key,
                        cached: true,
                        result,
                    }));
                    continue;
                }
                Err(e) => {
                    // stale shape from an older result format, recompute
                    warn!(key = %cache_key, error = %e, "Dropping unreadable cache entry");
                    cache.delete(&cache_key);
                }
            }
        }
        debug!(key = %cache_key, "Cache MISS - calling model");

        let response = match model.analyze(&request).await {
            Ok(result) => {
                match serde_json::to_value(&result) {
                    Ok(value) => cache.set(cache_key.clone(), value, None),
                    Err(e) => warn!(error = %e, "Result not cacheable"),
                }
                Ok(AnalyzeResponse {
                    cache_key,
                    cached: false,
                    result,
                })
            }
            Err(e) => {
                PROVIDER_FAILURES.inc();
                warn!(key = %cache_key, error = %e, "Model call failed");
                Err(e)
            }
        };

        // handler may have gone away; nothing to do then
        let _ = response_tx.send(response);
    }

    info!("Analysis worker stopped");
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cache::{AnalysisOptions, DEFAULT_TTL, make_cache_key};
    use crate::clock::ManualClock;
    use crate::error::ProviderError;
    use crate::models::AnalyzeRequest;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    // Counts calls and returns a fixed score, or fails when asked to
    pub(crate) struct StubModel {
        pub calls: AtomicUsize,
        pub fail: bool,
    }

    impl StubModel {
        pub(crate) fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl ComplianceModel for StubModel {
        async fn analyze(&self, _request: &AnalyzeRequest) -> Result<AnalysisResult, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::EmptyResponse);
            }
            Ok(AnalysisResult {
                score: 90,
                summary: "ok".into(),
                violations: vec![],
            })
        }
    }

    async fn submit(
        tx: &mpsc::Sender<AnalysisJob>,
        text: &str,
    ) -> Result<AnalyzeResponse, ProviderError> {
        let request = AnalyzeRequest {
            text: Some(text.into()),
            ..Default::default()
        };
        let (response_tx, response_rx) = oneshot::channel();
        tx.send(AnalysisJob {
            cache_key: make_cache_key(text, &AnalysisOptions::default()),
            request,
            response_tx,
        })
        .await
        .unwrap();
        response_rx.await.unwrap()
    }

    #[tokio::test]
    async fn second_identical_request_is_served_from_cache() {
        let model = Arc::new(StubModel::new());
        let cache = Arc::new(AnalysisCache::new(DEFAULT_TTL, Arc::new(ManualClock::default())));
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(analysis_worker(rx, model.clone(), cache.clone()));

        let first = submit(&tx, "policy text").await.unwrap();
        let second = submit(&tx, "policy text").await.unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(second.result.score, 90);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let model = Arc::new(StubModel {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let cache = Arc::new(AnalysisCache::new(DEFAULT_TTL, Arc::new(ManualClock::default())));
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(analysis_worker(rx, model.clone(), cache.clone()));

        assert!(submit(&tx, "doc").await.is_err());
        assert!(submit(&tx, "doc").await.is_err());
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }
}
