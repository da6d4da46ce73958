use lazy_static::lazy_static;
use prometheus::{
    Counter, Encoder, Gauge, Histogram, TextEncoder, register_counter, register_gauge,
    register_histogram,
};

lazy_static! {
    pub static ref ANALYZE_REQUESTS: Counter =
        register_counter!("compliance_analyze_requests_total", "Total number of analysis requests").unwrap();
    pub static ref CACHE_HITS: Counter =
        register_counter!("compliance_cache_hits_total", "Total analysis cache hits").unwrap();
    pub static ref CACHE_MISSES: Counter =
        register_counter!("compliance_cache_misses_total", "Total analysis cache misses").unwrap();
    pub static ref CACHE_EVICTIONS: Counter =
        register_counter!("compliance_cache_evictions_total", "Entries removed by TTL expiry").unwrap();
    pub static ref CACHE_SIZE: Gauge =
        register_gauge!("compliance_cache_size", "Current number of items in the analysis cache").unwrap();
    pub static ref PROVIDER_FAILURES: Counter =
        register_counter!("compliance_provider_failures_total", "Failed calls to the AI model").unwrap();
    pub static ref ANALYZE_LATENCY: Histogram = register_histogram!(
        "compliance_analyze_latency_seconds",
        "Analysis request latency in seconds"
    )
    .unwrap();
}

// Render every registered metric in the Prometheus text format
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
