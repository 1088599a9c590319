use std::time::Duration;

/// Session-level settings shared by both strategies.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Bound on each read attempt; elapsing without data is not an error,
    /// the read loop just tries again.
    pub read_timeout: Duration,
    /// Estimated one-way latency subtracted from scheduled press times in
    /// the deferred strategy.
    pub latency_compensation_ms: f64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(5),
            latency_compensation_ms: 30.0,
        }
    }
}
