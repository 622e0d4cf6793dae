use std::error::Error;

use octostream::dispatch::EventHandlers;
use octostream::transport::{Transport, XhrStreamingTransport};

fn main() -> Result<(), Box<dyn Error>> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:5000".to_string());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let handlers = EventHandlers::new()
            .on_open(|_| println!("session opened"))
            .on_close(|_| println!("session closed"))
            .on_message(|_, value| println!("event: {value}"));

        let mut transport = XhrStreamingTransport::new(&url, handlers)?;
        println!(
            "listening on {} (server {}, session {})",
            transport.session().host(),
            transport.session().server_id(),
            transport.session().session_id(),
        );

        transport.run();
        // The streaming transport reconnects forever; ^C to stop.
        transport.wait().await;

        Ok::<(), Box<dyn Error>>(())
    })
}
