//! Realtime push-notification client for OctoPrint-compatible print servers.
//!
//! The server multiplexes realtime sessions behind a SockJS-style line
//! protocol; this crate implements the client side of it:
//! - `session`: per-connection identity and endpoint URL construction.
//! - `frame`: the one-letter-tag wire frame codec.
//! - `dispatch`: callback configuration for push delivery.
//! - `transport`: the two transport bindings (`xhr_streaming` with unbounded
//!   reconnect, `websocket` with none).
//! - `reader`: lazy pull-model consumption of the same stream.
//!
//! The plain request/response control API is out of scope here; it
//! participates only by supplying a preconfigured [`reqwest::Client`] to the
//! constructors that accept one.

/// Callback configuration and frame dispatch.
pub mod dispatch;
/// Wire frame codec.
pub mod frame;
/// Pull-model reader and capability probe.
pub mod reader;
/// Session identity and endpoint URLs.
pub mod session;
/// Streaming transport drivers.
pub mod transport;
