//! Basic logger usage example
//!
//! Demonstrates console logging at different levels and minimum-level filtering.
//!
//! Run with: cargo run --example basic_usage

use batchlog::prelude::*;
use batchlog::{info, warn};

fn main() -> Result<()> {
    println!("=== batchlog - Basic Usage Example ===\n");

    println!("1. Logging at different levels:");
    let logger = Logger::new(
        LoggerConfig::default()
            .with_min_level(LogLevel::Debug)
            .with_flush_interval_ms(50),
    )?;
    logger.debug("This is a debug message");
    logger.info("This is an info message");
    logger.warn("This is a warning message");
    logger.error("This is an error message");
    logger.fatal("This is a fatal message");
    logger.dispose();

    println!("\n2. Minimum level set to WARN - debug and info won't show:");
    let logger = Logger::new(LoggerConfig::default().with_min_level(LogLevel::Warn))?;
    logger.debug("Debug message (hidden)");
    logger.info("Info message (hidden)");
    warn!(logger, "Retry attempt {} of {}", 3, 5);
    info!(logger, "Hidden too: {}", 42);
    logger.dispose();
    println!("   Filtered entries: {}", logger.metrics().filtered());

    println!("\n3. Invalid configuration is rejected up front:");
    match Logger::new(LoggerConfig::default().with_console(false).with_batch_size(0)) {
        Ok(_) => println!("   unexpectedly accepted"),
        Err(e) => {
            for problem in e.validation_errors() {
                println!("   - {}", problem);
            }
        }
    }

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
