//! Error types for paveos-realtime.

use thiserror::Error;

/// Errors produced by the realtime channel.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// WebSocket transport failure.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON payload could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A frame did not follow the Engine.IO/Socket.IO framing.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server refused the Socket.IO connect (bad token, etc.).
    #[error("Connect refused: {0}")]
    ConnectRefused(String),

    /// The WebSocket did not open in time.
    #[error("Connection attempt timed out")]
    ConnectTimeout,

    /// The server stopped sending pings.
    #[error("Heartbeat timed out")]
    HeartbeatTimeout,
}
