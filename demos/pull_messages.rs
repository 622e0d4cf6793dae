use std::error::Error;

use octostream::reader::StreamingReader;

fn main() -> Result<(), Box<dyn Error>> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:5000".to_string());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let reader = StreamingReader::new(&url)?;

        let info = reader.info().await?;
        println!(
            "server capabilities: websocket={} cookie_needed={}",
            info.websocket, info.cookie_needed
        );

        let mut messages = reader.read_loop();
        for _ in 0..10 {
            let message = messages.recv().await;
            println!("event: {message}");
        }

        Ok::<(), Box<dyn Error>>(())
    })
}
