use std::error::Error;

use octostream::dispatch::EventHandlers;
use octostream::transport::{Transport, WebSocketTransport};
use serde_json::json;

fn main() -> Result<(), Box<dyn Error>> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://localhost:5000".to_string());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let handlers = EventHandlers::new()
            .on_open(|handle| {
                println!("session opened, requesting throttle");
                if let Err(err) = handle.send(&json!({"throttle": 10})) {
                    eprintln!("queue send failed: {err}");
                }
            })
            .on_close(|_| println!("session closed"))
            .on_message(|_, value| println!("event: {value}"));

        let mut transport = WebSocketTransport::new(&url, handlers)?;
        transport.run();
        // The websocket binding does not reconnect: wait() returns as soon as
        // the server drops the connection.
        transport.wait().await;
        println!("connection ended");

        Ok::<(), Box<dyn Error>>(())
    })
}
