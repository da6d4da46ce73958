use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use compliance_gateway::cache::{AnalysisCache, spawn_sweeper};
use compliance_gateway::clock;
use compliance_gateway::config::Args;
use compliance_gateway::handlers::router;
use compliance_gateway::models::AnalysisJob;
use compliance_gateway::provider::GeminiModel;
use compliance_gateway::rate_limit::RateLimiter;
use compliance_gateway::state::AppState;
use compliance_gateway::worker::analysis_worker;

fn init_tracing(level: &str) {
    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let cache = Arc::new(
        AnalysisCache::new(args.cache_ttl(), clock::system()).with_soft_limit(args.cache_soft_limit),
    );
    let _sweeper = spawn_sweeper(Arc::clone(&cache), args.sweep_interval());

    let client = reqwest::Client::new();
    let model = Arc::new(GeminiModel::new(
        client,
        &args.model_url,
        &args.model,
        &args.api_key,
    ));
    if args.api_key.is_empty() {
        tracing::warn!("No model API key configured; analyses will fail");
    }

    let (jobs_tx, jobs_rx) = mpsc::channel::<AnalysisJob>(args.queue_depth);
    tokio::spawn(analysis_worker(jobs_rx, model, Arc::clone(&cache)));

    let state = Arc::new(AppState::new(
        cache,
        RateLimiter::new(args.rate_limit, args.rate_window()),
        jobs_tx,
    ));
    let app = router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(port = args.port, model = %args.model, "Compliance gateway listening");
    info!(
        ttl_secs = args.cache_ttl,
        sweep_secs = args.sweep_interval,
        soft_limit = args.cache_soft_limit,
        "Analysis cache configured"
    );
    info!(
        limit = args.rate_limit,
        window_secs = args.rate_window,
        "Rate limit configured"
    );

    // peer address feeds the per-client rate limit
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
