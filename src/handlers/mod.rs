mod analyze;
mod cache;
mod health;
mod metrics;

use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;

use crate::state::AppState;

pub use analyze::analyze_handler;
pub use cache::{cache_clear_handler, cache_delete_handler, cache_stats_handler};
pub use health::health_handler;
pub use metrics::metrics_handler;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/cache", delete(cache_clear_handler))
        .route("/api/cache/stats", get(cache_stats_handler))
        .route("/api/cache/{key}", delete(cache_delete_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{AnalysisCache, DEFAULT_TTL};
    use crate::clock::ManualClock;
    use crate::rate_limit::RateLimiter;
    use crate::worker::{analysis_worker, tests::StubModel};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    fn app(limit: u32) -> (Router, Arc<AnalysisCache>) {
        let cache = Arc::new(AnalysisCache::new(DEFAULT_TTL, Arc::new(ManualClock::default())));
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(analysis_worker(rx, Arc::new(StubModel::new()), cache.clone()));
        let state = Arc::new(AppState::new(
            cache.clone(),
            RateLimiter::new(limit, Duration::from_secs(60)),
            tx,
        ));
        (router(state), cache)
    }

    fn analyze(body: Value) -> Request<Body> {
        Request::post("/api/analyze")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(res: axum::response::Response) -> Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn analyze_then_hit_cache() {
        let (app, cache) = app(10);

        let res = app
            .clone()
            .oneshot(analyze(json!({"text": "terms", "marketing": true})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let first = json_body(res).await;
        assert_eq!(first["cached"], false);
        assert_eq!(first["score"], 90);

        let second = json_body(
            app.oneshot(analyze(json!({"text": "terms", "marketing": true})))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(second["cached"], true);
        assert_eq!(second["cacheKey"], first["cacheKey"]);
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn analyze_requires_text_or_id() {
        let (app, _) = app(10);
        let res = app.oneshot(analyze(json!({"marketing": true}))).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn analyze_is_rate_limited() {
        let (app, _) = app(1);
        let ok = app.clone().oneshot(analyze(json!({"text": "a"}))).await.unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        let limited = app.oneshot(analyze(json!({"text": "b"}))).await.unwrap();
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn rate_limit_is_per_client() {
        let (app, _) = app(1);
        let from = |ip: &str, text: &str| {
            let mut req = analyze(json!({"text": text}));
            req.headers_mut()
                .insert("x-forwarded-for", ip.parse().unwrap());
            req
        };

        let a = app.clone().oneshot(from("198.51.100.1", "a")).await.unwrap();
        assert_eq!(a.status(), StatusCode::OK);
        let b = app.clone().oneshot(from("198.51.100.2", "b")).await.unwrap();
        assert_eq!(b.status(), StatusCode::OK);

        let again = app.oneshot(from("198.51.100.1", "c")).await.unwrap();
        assert_eq!(again.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn cache_admin_routes() {
        let (app, cache) = app(10);
        cache.set("analysis:abc", json!({"score": 90}), None);
        cache.set("analysis:def", json!({"score": 10}), None);

        let res = app
            .clone()
            .oneshot(Request::delete("/api/cache/analysis:abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json_body(res).await, json!({"removed": true}));

        let stats = json_body(
            app.clone()
                .oneshot(Request::get("/api/cache/stats").body(Body::empty()).unwrap())
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(stats["count"], 1);

        let cleared = json_body(
            app.oneshot(Request::delete("/api/cache").body(Body::empty()).unwrap())
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(cleared, json!({"cleared": 1}));
        assert!(cache.is_empty());
    }
}
