//! Full-duplex websocket transport.
//!
//! A dropped connection simply ends the background task: no retry and no
//! surfaced error, in deliberate contrast to the streaming binding's
//! reconnect-forever loop. Both behaviors are part of the protocol contract.

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::dispatch::{EventHandlers, SendHandle};
use crate::frame::Frame;
use crate::session::Session;
use crate::transport::{StreamError, Transport};

/// Push-model transport over the `websocket` endpoint.
pub struct WebSocketTransport {
    session: Session,
    handlers: EventHandlers,
    outbound_tx: mpsc::UnboundedSender<String>,
    outbound_rx: Option<mpsc::UnboundedReceiver<String>>,
    worker: Option<JoinHandle<()>>,
}

impl WebSocketTransport {
    /// Creates a transport for the websocket binding.
    pub fn new(url: &str, handlers: EventHandlers) -> Result<Self, StreamError> {
        Ok(Self::from_session(Session::new(url)?, handlers))
    }

    /// Creates a transport from an explicit session identity.
    pub fn from_session(session: Session, handlers: EventHandlers) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        Self {
            session,
            handlers,
            outbound_tx,
            outbound_rx: Some(outbound_rx),
            worker: None,
        }
    }

    /// Session identity backing this transport.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Cloneable queue handle, the same one passed to callbacks.
    pub fn send_handle(&self) -> SendHandle {
        SendHandle::new(self.outbound_tx.downgrade())
    }

    /// Queues one payload as a plain JSON text frame.
    ///
    /// Outbound frames skip the array framing the server expects, so strict
    /// servers fail to parse them (see [`crate::frame::encode_payload`]).
    pub fn send_text(&self, payload: &Value) -> Result<(), StreamError> {
        self.send_handle().send(payload)
    }
}

impl Transport for WebSocketTransport {
    fn run(&mut self) {
        let Some(outbound_rx) = self.outbound_rx.take() else {
            return;
        };
        let url = self.session.ws_endpoint();
        let handlers = self.handlers.clone();
        let handle = SendHandle::new(self.outbound_tx.downgrade());
        self.worker = Some(tokio::spawn(socket_worker(
            url,
            handlers,
            handle,
            outbound_rx,
        )));
    }

    async fn send(&self, payload: &Value) -> Result<(), StreamError> {
        self.send_text(payload)
    }

    async fn wait(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.await;
        }
    }
}

async fn socket_worker(
    url: String,
    handlers: EventHandlers,
    handle: SendHandle,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
) {
    let mut socket = match connect_async(url.as_str()).await {
        Ok((socket, _)) => socket,
        Err(err) => {
            debug!(error = %err, "websocket connect failed");
            return;
        }
    };

    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => {
                match outbound {
                    Some(text) => {
                        if socket.send(Message::Text(text)).await.is_err() {
                            return;
                        }
                    }
                    None => {
                        // Transport dropped; close the socket and finish.
                        let _ = socket.close(None).await;
                        return;
                    }
                }
            }
            inbound = socket.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        match Frame::parse(&text) {
                            Ok(Some(frame)) => handlers.dispatch(&handle, frame),
                            Ok(None) => {}
                            Err(err) => warn!(error = %err, "skipping malformed frame"),
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            return;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}
