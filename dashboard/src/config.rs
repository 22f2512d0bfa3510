use clap::Parser;
use std::time::Duration;

/// Headless herd dashboard: polls the telemetry API and keeps the scene in sync.
#[derive(Debug, Clone, Parser)]
#[command(name = "dashboard", version)]
pub struct Args {
    /// Base URL of the telemetry API, e.g. http://localhost:5000
    #[arg(long, env = "API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Key sent in the X-API-Key header
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "POLL_INTERVAL_SECS", default_value_t = 10)]
    pub poll_interval_secs: u64,

    /// Delay before the map is resized and recentered after creation
    #[arg(long, env = "SETTLE_DELAY_MS", default_value_t = 300)]
    pub settle_delay_ms: u64,

    #[arg(long, env = "HTTP_ADDR", default_value = "0.0.0.0:8080")]
    pub http_addr: String,

    /// Skip a tick while the previous cycle is still running
    #[arg(long, env = "SINGLE_FLIGHT")]
    pub single_flight: bool,

    /// Remove markers whose id disappeared from the id list
    #[arg(long, env = "EVICT_STALE_MARKERS")]
    pub evict_stale_markers: bool,
}

/// Connection settings for the telemetry API
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// Every tick starts a cycle, even if the previous one is still running.
    Overlap,
    SingleFlight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    pub interval: Duration,
    pub settle_delay: Duration,
    pub overlap: OverlapPolicy,
    pub evict_stale_markers: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            settle_delay: Duration::from_millis(300),
            overlap: OverlapPolicy::Overlap,
            evict_stale_markers: false,
        }
    }
}

impl Args {
    /// Both the base URL and the key must be present and non-empty before
    /// the poll loop may be armed.
    pub fn api_config(&self) -> Option<ApiConfig> {
        let base_url = self.api_base_url.as_deref().map(str::trim)?;
        let api_key = self.api_key.as_deref().map(str::trim)?;
        if base_url.is_empty() || api_key.is_empty() {
            return None;
        }

        Some(ApiConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            overlap: if self.single_flight {
                OverlapPolicy::SingleFlight
            } else {
                OverlapPolicy::Overlap
            },
            evict_stale_markers: self.evict_stale_markers,
        }
    }
}
