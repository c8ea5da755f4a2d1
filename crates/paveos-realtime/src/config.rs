//! Configuration for the realtime connection.

use std::time::Duration;

/// Backoff between reconnect attempts after the transport drops.
///
/// The defaults follow the Socket.IO browser client: half a second,
/// doubling, never more than thirty seconds apart, retrying forever.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Failed attempts tolerated before the link is abandoned. `None`
    /// keeps trying for as long as the connection exists.
    pub max_attempts: Option<u32>,
    pub first_delay: Duration,
    pub delay_cap: Duration,
    /// Growth factor applied per failed attempt; values below 1 are
    /// treated as 1.
    pub factor: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            first_delay: Duration::from_millis(500),
            delay_cap: Duration::from_secs(30),
            factor: 2.0,
        }
    }
}

impl ReconnectPolicy {
    /// A policy that gives up on the first transport failure.
    pub fn never() -> Self {
        Self {
            max_attempts: Some(0),
            ..Self::default()
        }
    }

    /// Pause before retry number `failures` (zero for the first retry).
    pub fn delay(&self, failures: u32) -> Duration {
        let exponent = i32::try_from(failures).unwrap_or(i32::MAX);
        let secs = self.first_delay.as_secs_f64() * self.factor.max(1.0).powi(exponent);
        Duration::try_from_secs_f64(secs)
            .map_or(self.delay_cap, |delay| delay.min(self.delay_cap))
    }

    /// Whether another attempt is allowed after `failures` failed ones.
    pub fn allows(&self, failures: u32) -> bool {
        match self.max_attempts {
            Some(max) => failures < max,
            None => true,
        }
    }
}

/// Configuration for connecting to the realtime server.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// Server root URL (http/https/ws/wss), without the `/socket.io` path.
    pub url: String,
    /// Reconnection policy after the transport drops.
    pub reconnect: ReconnectPolicy,
    /// Capacity of the event fan-out buffer. Listeners that fall further
    /// behind than this skip ahead.
    pub event_buffer: usize,
    /// Give up a single connection attempt after this long.
    pub connect_timeout: Duration,
}

impl SocketConfig {
    /// Create a configuration for the given server URL.
    pub fn new(url: impl Into<String>) -> Self {
        let url: String = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
            reconnect: ReconnectPolicy::default(),
            event_buffer: 256,
            connect_timeout: Duration::from_secs(20),
        }
    }

    /// Replace the reconnection policy.
    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// WebSocket endpoint for the Engine.IO v4 transport.
    pub fn websocket_url(&self) -> String {
        let base = if let Some(rest) = self.url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.url.clone()
        };
        format!("{base}/socket.io/?EIO=4&transport=websocket")
    }
}
