//! Streaming transport drivers.
//!
//! Two independent bindings deliver the same decoded-frame stream:
//! - `xhr_streaming`: persistent HTTP streaming connection, reconnecting
//!   forever.
//! - `websocket`: full-duplex socket connection, no reconnect.
//!
//! Message semantics are transport-independent; both feed the dispatcher in
//! [`crate::dispatch`] through the codec in [`crate::frame`].

/// Full-duplex websocket binding.
pub mod websocket;
/// Persistent HTTP streaming binding.
pub mod xhr_streaming;

pub use websocket::WebSocketTransport;
pub use xhr_streaming::XhrStreamingTransport;

use serde_json::Value;
use thiserror::Error;

use crate::session::SessionError;

/// Errors produced by transport construction and the send path.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Session/URL construction failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// HTTP transport error.
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// JSON encode/decode error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Outbound queue is closed because the worker is gone.
    #[error("send queue is closed")]
    SendQueueClosed,
}

/// Common capability surface of the two transport bindings.
///
/// Each implementation owns at most one live connection and one background
/// task at a time. `run` starts the task and returns immediately; `wait`
/// parks the caller until the task ends, which for the streaming binding only
/// happens through its cancellation token.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Starts the background read loop. Calls after the first are no-ops.
    fn run(&mut self);

    /// Transmits one payload from the caller's context.
    async fn send(&self, payload: &Value) -> Result<(), StreamError>;

    /// Blocks until the background task completes.
    ///
    /// A callback panic ends the task early; `wait` returns normally in that
    /// case, with no error surfaced.
    async fn wait(&mut self);
}
