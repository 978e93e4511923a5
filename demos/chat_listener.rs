//! Chat channel listener example
//!
//! Run with: cargo run --example chat_listener [WS_BASE] [PUBLISH_BASE]
//!
//! Examples:
//!   cargo run --example chat_listener
//!       # ws://localhost:3000 / http://localhost:3000/api/broadcast
//!   cargo run --example chat_listener ws://localhost:8080 http://localhost:8080/api/broadcast
//!
//! Subscribes to `view:chat:message:sent` with self-omission, publishes one
//! message every few seconds, and prints everything other clients broadcast.
//! The connection survives server restarts: drop the server and bring it back
//! to watch the status transitions and the automatic re-connect.

use std::time::Duration;

use viewbus::bus::{BroadcastBus, BusConfig, SubscribeOptions};
use viewbus::identity::ClientIdentity;

const CHANNEL: &str = "view:chat:message:sent";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let ws_base = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| "ws://localhost:3000".to_string());
    let publish_base = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| "http://localhost:3000/api/broadcast".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("viewbus=debug".parse()?),
        )
        .init();

    let config = BusConfig::new(ws_base, publish_base);
    let bus = BroadcastBus::new(config, ClientIdentity::session("/tmp/chat_listener.id"));

    println!("Listening on {CHANNEL} as {}", bus.identity().id());

    bus.subscribe(
        CHANNEL,
        |data, _frame| {
            let who = data["identity"].as_str().unwrap_or("anonymous");
            let text = data["text"].as_str().unwrap_or("<no text>");
            println!("[{who}] {text}");
        },
        SubscribeOptions::default().omit_self(),
    )?;

    let mut counter = 0u32;
    loop {
        tokio::time::sleep(Duration::from_secs(5)).await;
        counter += 1;

        match bus
            .publish(CHANNEL, serde_json::json!({"text": format!("ping #{counter}")}))
            .await
        {
            Ok(Some(response)) => println!("published #{counter}: {response}"),
            Ok(None) => println!("offline, message #{counter} dropped"),
            Err(e) => eprintln!("publish failed: {e}"),
        }
    }
}
