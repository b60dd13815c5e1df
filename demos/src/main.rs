//! Connects to the local TwinCAT runtime, reads device info and a couple of symbols,
//! and subscribes to change notifications on one of them.
//!
//! Run with `RUST_LOG=adsrs_client=debug cargo run -p adsrs-demos` against a reachable
//! router; there is no mock server here, so without one the initial connect fails fast.

use std::time::Duration;

use adsrs::client::{Connection, ConnectionConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = ConnectionConfig::local();
    let conn = Connection::connect_with_config(config).await?;

    let (major, minor, build, name) = conn.get_info().await?;
    println!("connected to {name} v{major}.{minor}.{build}");

    let (state, device_state) = conn.get_state().await?;
    println!("ads state: {state:?}, device state: {device_state}");

    let handle = conn.get_handle("MAIN.counter").await?;
    let counter: i32 = conn.read_value(handle).await?;
    println!("MAIN.counter = {counter}");

    let notification = conn
        .on_change::<i32>(
            "MAIN.counter",
            Duration::from_millis(100),
            Duration::from_millis(0),
            |value| println!("MAIN.counter changed to {value}"),
        )
        .await?;

    tokio::time::sleep(Duration::from_secs(10)).await;

    conn.remove_notification(notification).await?;
    conn.release_handle(handle).await?;
    conn.disconnect().await?;

    Ok(())
}
