//! File logging example
//!
//! Demonstrates size-based rotation with backup retention and compression.
//!
//! Run with: cargo run --example file_logging

use rust_async_log_engine::prelude::*;
use rust_async_log_engine::info;
use std::fs;

fn main() -> Result<()> {
    println!("=== Rust Async Log Engine - File Logging Example ===\n");

    let dir = std::env::temp_dir().join("rust_async_log_engine_demo");
    let log_file = dir.join("app.log");

    let engine = LogEngine::new();
    engine.init(
        LoggerConfig::new()
            .with_log_file(&log_file)
            .with_console(false)
            .with_max_file_size(4 * 1024)
            .with_max_backups(3)
            .with_compression(true),
    )?;

    println!("Writing to {}", log_file.display());
    for i in 0..500 {
        info!(engine, "request id={} status=200 bytes={}", i, i * 17);
    }

    engine.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);

    let mut entries: Vec<_> = fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    entries.sort();

    println!("\nFiles after rotation:");
    for name in entries {
        println!("  {}", name);
    }
    println!("\nStats: {:?}", engine.stats());

    Ok(())
}
