//! Persistent HTTP streaming transport.
//!
//! One background task POSTs `xhr_streaming` and decodes the chunked response
//! body line by line. The per-attempt connection is dropped on any stream end
//! or I/O error and a new POST is issued immediately, with no backoff and no
//! attempt cap; the loop exits only through the cancellation token.

use reqwest::Client;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::dispatch::{EventHandlers, SendHandle};
use crate::frame::{encode_payload, Frame};
use crate::session::Session;
use crate::transport::{StreamError, Transport};

/// Push-model transport over the `xhr_streaming` endpoint.
pub struct XhrStreamingTransport {
    session: Session,
    http: Client,
    handlers: EventHandlers,
    outbound_tx: mpsc::UnboundedSender<String>,
    outbound_rx: Option<mpsc::UnboundedReceiver<String>>,
    cancel: CancellationToken,
    worker: Option<JoinHandle<()>>,
}

impl XhrStreamingTransport {
    /// Creates a transport with a default HTTP client.
    pub fn new(url: &str, handlers: EventHandlers) -> Result<Self, StreamError> {
        Self::with_client(url, handlers, Client::new())
    }

    /// Creates a transport reusing a preconfigured HTTP client.
    ///
    /// The control-API wrapper typically supplies a client with auth headers
    /// already installed.
    pub fn with_client(
        url: &str,
        handlers: EventHandlers,
        http: Client,
    ) -> Result<Self, StreamError> {
        Ok(Self::from_session(Session::new(url)?, handlers, http))
    }

    /// Creates a transport from an explicit session identity.
    pub fn from_session(session: Session, handlers: EventHandlers, http: Client) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        Self {
            session,
            http,
            handlers,
            outbound_tx,
            outbound_rx: Some(outbound_rx),
            cancel: CancellationToken::new(),
            worker: None,
        }
    }

    /// Replaces the default never-cancelled token.
    ///
    /// Cancelling the token is the only way to stop the otherwise unbounded
    /// reconnect loop.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Session identity backing this transport.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Cloneable queue handle, the same one passed to callbacks.
    pub fn send_handle(&self) -> SendHandle {
        SendHandle::new(self.outbound_tx.downgrade())
    }

    /// Sends one payload from the caller's context and returns the raw
    /// response.
    ///
    /// The request body is the bare JSON serialization of `payload`; no
    /// status-code validation or retry is applied, and strict servers reject
    /// the unframed body (see [`crate::frame::encode_payload`]).
    pub async fn send_raw(&self, payload: &Value) -> Result<reqwest::Response, StreamError> {
        let body = encode_payload(payload)?;
        let url = self.session.http_endpoint("xhr_send");
        Ok(self.http.post(url).body(body).send().await?)
    }
}

impl Transport for XhrStreamingTransport {
    fn run(&mut self) {
        let Some(outbound_rx) = self.outbound_rx.take() else {
            return;
        };
        let worker = StreamingWorker {
            url: self.session.http_endpoint("xhr_streaming"),
            send_url: self.session.http_endpoint("xhr_send"),
            http: self.http.clone(),
            handlers: self.handlers.clone(),
            handle: SendHandle::new(self.outbound_tx.downgrade()),
            outbound_rx,
        };
        let cancel = self.cancel.clone();
        self.worker = Some(tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = worker.run() => {}
            }
        }));
    }

    async fn send(&self, payload: &Value) -> Result<(), StreamError> {
        self.send_raw(payload).await.map(|_| ())
    }

    async fn wait(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.await;
        }
    }
}

struct StreamingWorker {
    url: String,
    send_url: String,
    http: Client,
    handlers: EventHandlers,
    handle: SendHandle,
    outbound_rx: mpsc::UnboundedReceiver<String>,
}

impl StreamingWorker {
    async fn run(mut self) {
        loop {
            match self.http.post(&self.url).send().await {
                Ok(response) => {
                    self.read_attempt(response).await;
                    debug!("stream ended, reconnecting");
                }
                Err(err) => debug!(error = %err, "streaming connect failed"),
            }
        }
    }

    /// Reads one connection attempt to exhaustion, draining queued outbound
    /// payloads between chunks. Returning drops the response, which releases
    /// the connection on every exit path.
    async fn read_attempt(&mut self, mut response: reqwest::Response) {
        let mut buffer = Vec::new();
        loop {
            tokio::select! {
                chunk = response.chunk() => {
                    match chunk {
                        Ok(Some(chunk)) => {
                            buffer.extend_from_slice(&chunk);
                            dispatch_lines(&self.handlers, &self.handle, &mut buffer);
                        }
                        Ok(None) => return,
                        Err(err) => {
                            debug!(error = %err, "stream read failed");
                            return;
                        }
                    }
                }
                Some(text) = self.outbound_rx.recv() => {
                    self.post_outbound(text).await;
                }
            }
        }
    }

    async fn post_outbound(&self, body: String) {
        if let Err(err) = self.http.post(&self.send_url).body(body).send().await {
            debug!(error = %err, "queued send failed");
        }
    }
}

/// Splits complete lines off `buffer` and dispatches each decoded frame.
///
/// Malformed JSON after a message/array tag is skipped so one bad frame cannot
/// take the read loop down.
fn dispatch_lines(handlers: &EventHandlers, handle: &SendHandle, buffer: &mut Vec<u8>) {
    while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
        let raw: Vec<u8> = buffer.drain(..=pos).collect();
        let line = String::from_utf8_lossy(&raw);
        let line = line.trim_end_matches(['\r', '\n']);
        match Frame::parse(line) {
            Ok(Some(frame)) => handlers.dispatch(handle, frame),
            Ok(None) => {}
            Err(err) => warn!(error = %err, line, "skipping malformed frame"),
        }
    }
}
