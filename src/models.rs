use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reserved latency value meaning "no successful measurement".
pub const SENTINEL_LATENCY_MS: f64 = -1.0;

// The map UI expects these fields; nothing measures them yet.
pub const PLACEHOLDER_UPTIME: f64 = 99.9;
pub const PLACEHOLDER_ALERT_COUNT: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReachabilityResult {
    pub server: String,
    pub is_up: bool,
    pub latency: f64,
}

impl ReachabilityResult {
    pub fn up(server: &str, rtt: Duration) -> Self {
        Self {
            server: server.to_string(),
            is_up: true,
            latency: round_millis(rtt),
        }
    }

    pub fn down(server: &str) -> Self {
        Self {
            server: server.to_string(),
            is_up: false,
            latency: SENTINEL_LATENCY_MS,
        }
    }
}

/// Round-trip time in milliseconds, rounded to two decimals.
pub fn round_millis(rtt: Duration) -> f64 {
    (rtt.as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoredServerEntry {
    pub ip: String,
    pub latitude: String,
    pub longitude: String,
    pub latency: f64,
    pub uptime: f64,
    #[serde(rename = "alertCount")]
    pub alert_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub response: String,
}
