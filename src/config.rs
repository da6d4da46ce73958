use clap::Parser;
use std::time::Duration;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "compliance-gateway")]
#[command(about = "Document compliance analysis service with a result cache")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Base URL of the generative language API
    #[arg(long, default_value = "https://generativelanguage.googleapis.com")]
    pub model_url: String,

    // Model used for compliance analysis
    #[arg(short, long, default_value = "gemini-1.5-flash")]
    pub model: String,

    // API key for the model provider
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true, default_value = "")]
    pub api_key: String,

    // Cache TTL in seconds
    #[arg(short, long, default_value_t = 600)]
    pub cache_ttl: u64,

    // Interval between sweeps of expired cache entries
    #[arg(long, default_value_t = 120)]
    pub sweep_interval: u64,

    // Entry count past which the cache logs a warning (it is never capped)
    #[arg(long, default_value_t = 10_000)]
    pub cache_soft_limit: usize,

    // Rate limit max requests per window
    #[arg(long, default_value_t = 10)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, default_value_t = 60)]
    pub rate_window: u64,

    // Depth of the analysis queue in front of the worker
    #[arg(long, default_value_t = 100)]
    pub queue_depth: usize,

    // Log filter, used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }

    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cache_policy() {
        let args = Args::parse_from(["compliance-gateway"]);
        assert_eq!(args.cache_ttl(), Duration::from_secs(600));
        assert_eq!(args.sweep_interval(), Duration::from_secs(120));
        assert_eq!(args.port, 8080);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "compliance-gateway",
            "--cache-ttl",
            "30",
            "--rate-limit",
            "3",
            "--model",
            "gemini-pro",
        ]);
        assert_eq!(args.cache_ttl, 30);
        assert_eq!(args.rate_limit, 3);
        assert_eq!(args.model, "gemini-pro");
    }
}
