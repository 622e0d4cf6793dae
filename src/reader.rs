//! Pull-model message consumption.
//!
//! [`StreamingReader`] exposes the streaming endpoint as a lazy sequence:
//! pulling the next message drives the network read on the caller's own task,
//! with no background worker involved.

use std::collections::VecDeque;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::frame::{encode_payload, Frame};
use crate::session::Session;
use crate::transport::StreamError;

/// Server capability descriptor served at `/sockjs/info`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ServerInfo {
    /// Whether the server accepts websocket sessions.
    #[serde(default)]
    pub websocket: bool,
    /// Whether the server requires cookie affinity.
    #[serde(default)]
    pub cookie_needed: bool,
    /// Origins allowed to connect.
    #[serde(default)]
    pub origins: Vec<String>,
    /// Server-provided entropy for client-side randomization.
    #[serde(default)]
    pub entropy: Option<u64>,
}

/// Pull-model client for the `xhr_streaming` endpoint.
pub struct StreamingReader {
    session: Session,
    http: Client,
}

impl StreamingReader {
    /// Creates a reader with a default HTTP client.
    pub fn new(url: &str) -> Result<Self, StreamError> {
        Self::with_client(url, Client::new())
    }

    /// Creates a reader reusing a preconfigured HTTP client.
    pub fn with_client(url: &str, http: Client) -> Result<Self, StreamError> {
        Ok(Self {
            session: Session::new(url)?,
            http,
        })
    }

    /// Creates a reader from an explicit session identity.
    pub fn from_session(session: Session, http: Client) -> Self {
        Self { session, http }
    }

    /// Session identity backing this reader.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Fetches the server capability descriptor.
    pub async fn info(&self) -> Result<ServerInfo, StreamError> {
        let response = self.http.get(self.session.info_endpoint()).send().await?;
        Ok(response.json().await?)
    }

    /// Starts a fresh lazy message sequence.
    ///
    /// Every call returns an independent sequence with its own connection
    /// state; an abandoned one is released by dropping it.
    pub fn read_loop(&self) -> MessageStream {
        MessageStream {
            url: self.session.http_endpoint("xhr_streaming"),
            http: self.http.clone(),
            connection: None,
            buffer: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    /// Sends one payload and returns the raw response.
    ///
    /// Same unframed body and unchecked response as the push transports' send
    /// path (see [`crate::frame::encode_payload`]).
    pub async fn send(&self, payload: &Value) -> Result<reqwest::Response, StreamError> {
        let body = encode_payload(payload)?;
        let url = self.session.http_endpoint("xhr_send");
        Ok(self.http.post(url).body(body).send().await?)
    }
}

/// Lazy, infinite sequence of decoded messages.
///
/// Control frames are consumed internally; only message payloads and array
/// elements reach the consumer, in wire order. The sequence reconnects on
/// every stream end or error and never terminates on its own: stopping is the
/// consumer's job (stop polling and drop the stream).
pub struct MessageStream {
    url: String,
    http: Client,
    connection: Option<reqwest::Response>,
    buffer: Vec<u8>,
    pending: VecDeque<Value>,
}

impl MessageStream {
    /// Pulls the next message, blocking the caller at the network read.
    pub async fn recv(&mut self) -> Value {
        loop {
            if let Some(value) = self.pending.pop_front() {
                return value;
            }
            self.fill_pending().await;
        }
    }

    async fn fill_pending(&mut self) {
        loop {
            if self.connection.is_none() {
                match self.http.post(&self.url).send().await {
                    Ok(connection) => {
                        self.buffer.clear();
                        self.connection = Some(connection);
                    }
                    Err(err) => {
                        debug!(error = %err, "streaming connect failed");
                        continue;
                    }
                }
            }
            let Some(connection) = self.connection.as_mut() else {
                continue;
            };

            match connection.chunk().await {
                Ok(Some(chunk)) => {
                    self.buffer.extend_from_slice(&chunk);
                    self.decode_buffered();
                    if !self.pending.is_empty() {
                        return;
                    }
                }
                Ok(None) => {
                    self.connection = None;
                    debug!("stream ended, reconnecting");
                }
                Err(err) => {
                    self.connection = None;
                    debug!(error = %err, "stream read failed");
                }
            }
        }
    }

    fn decode_buffered(&mut self) {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\r', '\n']);
            match Frame::parse(line) {
                Ok(Some(Frame::Message(value))) => self.pending.push_back(value),
                Ok(Some(Frame::Array(values))) => self.pending.extend(values),
                Ok(Some(_)) | Ok(None) => {}
                Err(err) => warn!(error = %err, line, "skipping malformed frame"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use serde_json::json;

    use super::MessageStream;

    fn empty_stream() -> MessageStream {
        MessageStream {
            url: "http://printer.local/sockjs/0/00000000/xhr_streaming".to_string(),
            http: reqwest::Client::new(),
            connection: None,
            buffer: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    #[test]
    fn control_frames_are_consumed_and_messages_kept_in_order() {
        let mut stream = empty_stream();
        stream
            .buffer
            .extend_from_slice(b"o\nh\nm{\"x\":1}\na[{\"x\":2},{\"x\":3}]\n");

        stream.decode_buffered();

        assert_eq!(
            stream.pending,
            vec![json!({"x": 1}), json!({"x": 2}), json!({"x": 3})]
        );
    }

    #[test]
    fn partial_lines_wait_for_the_rest_of_the_chunk() {
        let mut stream = empty_stream();
        stream.buffer.extend_from_slice(b"m{\"x\"");
        stream.decode_buffered();
        assert!(stream.pending.is_empty());

        stream.buffer.extend_from_slice(b":1}\n");
        stream.decode_buffered();
        assert_eq!(stream.pending, vec![json!({"x": 1})]);
    }

    #[test]
    fn malformed_and_unknown_lines_are_skipped() {
        let mut stream = empty_stream();
        stream
            .buffer
            .extend_from_slice(b"m{broken\nz???\nm{\"ok\":true}\n");

        stream.decode_buffered();

        assert_eq!(stream.pending, vec![json!({"ok": true})]);
    }
}
