//! Basic engine usage example
//!
//! Demonstrates console logging at different levels and runtime level changes.
//!
//! Run with: cargo run --example basic_usage

use rust_async_log_engine::prelude::*;
use rust_async_log_engine::{debug, error, info, warn};

fn main() -> Result<()> {
    println!("=== Rust Async Log Engine - Basic Usage Example ===\n");

    let engine = LogEngine::new();
    engine.init(
        LoggerConfig::new()
            .with_file(false)
            .with_level(LogLevel::Debug),
    )?;

    println!("1. Logging at different levels:");
    debug!(engine, "This is a debug message");
    info!(engine, "This is an info message");
    warn!(engine, "This is a warning message");
    error!(engine, "This is an error message");
    engine.log(LogLevel::Info, "AUDIT", "Custom label in the level slot");

    // Let the worker print before the next heading
    std::thread::sleep(std::time::Duration::from_millis(50));

    println!("\n2. Raising the runtime threshold to WARN:");
    engine.set_level(LogLevel::Warn);
    info!(engine, "Info message (hidden)");
    warn!(engine, "Warning message (visible)");

    engine.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
    println!("\nStats: {:?}", engine.stats());
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
