//! Concurrent logging example
//!
//! Demonstrates many producer threads, a deliberately small queue, the
//! overflow callback and the streaming logger.
//!
//! Run with: cargo run --example async_logging

use rust_async_log_engine::prelude::*;
use rust_async_log_engine::info_stream;
use std::sync::Arc;
use std::thread;

fn main() -> Result<()> {
    println!("=== Rust Async Log Engine - Concurrent Logging Example ===\n");

    let engine = Arc::new(
        LogEngine::builder()
            .config(LoggerConfig::new().with_file(false).with_color(true))
            .capacity(256)
            .on_overflow(Arc::new(|dropped| {
                eprintln!("ALERT: {} logs dropped so far", dropped);
            }))
            .build(),
    );
    engine.start()?;

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for i in 0..2_000 {
                    info_stream!(engine)
                        .append("thread=")
                        .append(t)
                        .append(" seq=")
                        .append(i);
                }
            })
        })
        .collect();

    for handle in handles {
        let _ = handle.join();
    }

    engine.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);

    let stats = engine.stats();
    println!("\nSubmitted:  {}", stats.total_submitted);
    println!("Dispatched: {}", stats.total_dispatched);
    println!("Dropped:    {} ({:.2}%)", stats.total_dropped, stats.drop_rate());
    println!("Peak depth: {}", stats.peak_queue_depth);

    Ok(())
}
