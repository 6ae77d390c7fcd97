//! Drive the bundled bootstrap workflow from the command line.
//!
//! Walks the happy path of the startup machine, detours through the
//! settings overlay, and shows history bringing the flow back to where it
//! was suspended. Run with RUST_LOG=strata=debug to watch the interpreter.
//!
//! Run with: cargo run --example startup_flow

use serde_json::json;
use strata::core::Event;
use strata::workflows::get_started;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut interpreter = get_started::interpreter()?;
    interpreter.start()?;

    let script = [
        Event::new("START_REGULAR_DAEMON"),
        Event::with_payload("CONNECT_DAEMON", json!({ "credentials": { "rpc_user": "demo" } })),
        Event::new("SYNC_DAEMON"),
        Event::new("CHECK_NETWORK_MATCH"),
        Event::new("CHOOSE_WALLET"),
        // Overlay detour: settings suspends the flow, BACK resumes it.
        Event::new("SHOW_SETTINGS"),
        Event::new("BACK"),
        Event::with_payload(
            "SUBMIT_CHOOSE_WALLET",
            json!({ "selectedWallet": { "wallet": "default", "isWatchingOnly": false } }),
        ),
        Event::new("SYNC_RPC"),
    ];

    for event in script {
        let name = event.event_type.clone();
        let snapshot = interpreter.send(event)?;
        println!(
            "{:28} -> {}",
            name,
            snapshot
                .leaf()
                .map(|id| id.as_str())
                .unwrap_or("<no active state>")
        );
    }

    println!("\ntransitions committed: {}", interpreter.trace().len());
    Ok(())
}
