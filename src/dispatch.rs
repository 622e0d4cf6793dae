//! Push-model event dispatch.
//!
//! Callbacks run on the transport's background task, concurrently with the
//! caller's thread. No reentrancy guard or locking is provided; treat the
//! callback boundary as concurrent code.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::frame::{encode_payload, Frame};
use crate::transport::StreamError;

type EventFn = dyn Fn(&SendHandle) + Send + Sync;
type MessageFn = dyn Fn(&SendHandle, Value) + Send + Sync;

/// Caller-supplied callback set with no-op defaults.
///
/// Handlers are immutable once a transport is constructed from them; build the
/// full set up front.
#[derive(Clone)]
pub struct EventHandlers {
    on_open: Arc<EventFn>,
    on_close: Arc<EventFn>,
    on_message: Arc<MessageFn>,
}

impl EventHandlers {
    /// Creates a handler set where every callback is a no-op.
    pub fn new() -> Self {
        Self {
            on_open: Arc::new(|_| {}),
            on_close: Arc::new(|_| {}),
            on_message: Arc::new(|_, _| {}),
        }
    }

    /// Sets the callback invoked when the server opens the session.
    pub fn on_open(mut self, callback: impl Fn(&SendHandle) + Send + Sync + 'static) -> Self {
        self.on_open = Arc::new(callback);
        self
    }

    /// Sets the callback invoked when the server closes the session.
    pub fn on_close(mut self, callback: impl Fn(&SendHandle) + Send + Sync + 'static) -> Self {
        self.on_close = Arc::new(callback);
        self
    }

    /// Sets the callback invoked once per decoded message.
    ///
    /// Array frames fan out to one invocation per element, in array order.
    pub fn on_message(
        mut self,
        callback: impl Fn(&SendHandle, Value) + Send + Sync + 'static,
    ) -> Self {
        self.on_message = Arc::new(callback);
        self
    }

    /// Routes one decoded frame to the matching callback.
    ///
    /// Heartbeats are consumed here and never surfaced.
    pub(crate) fn dispatch(&self, handle: &SendHandle, frame: Frame) {
        match frame {
            Frame::Open => (self.on_open)(handle),
            Frame::Close => (self.on_close)(handle),
            Frame::Message(value) => (self.on_message)(handle, value),
            Frame::Array(values) => {
                for value in values {
                    (self.on_message)(handle, value);
                }
            }
            Frame::Heartbeat => {}
        }
    }
}

impl Default for EventHandlers {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlers").finish_non_exhaustive()
    }
}

/// Cloneable handle for sending payloads from callbacks.
///
/// Payloads are queued to the owning transport's background worker, which
/// performs the actual write on its own schedule. The handle holds the queue
/// weakly, so it stays valid only while its transport is alive and never
/// keeps the worker's queue open by itself.
#[derive(Clone, Debug)]
pub struct SendHandle {
    tx: mpsc::WeakUnboundedSender<String>,
}

impl SendHandle {
    pub(crate) fn new(tx: mpsc::WeakUnboundedSender<String>) -> Self {
        Self { tx }
    }

    /// Queues one payload for transmission on the owning transport.
    pub fn send(&self, payload: &Value) -> Result<(), StreamError> {
        let text = encode_payload(payload)?;
        let Some(tx) = self.tx.upgrade() else {
            return Err(StreamError::SendQueueClosed);
        };
        tx.send(text).map_err(|_| StreamError::SendQueueClosed)
    }
}
