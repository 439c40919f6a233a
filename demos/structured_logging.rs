//! Structured logging in the three output formats
//!
//! Run with: cargo run --example structured_logging

use batchlog::prelude::*;

#[derive(Debug, thiserror::Error)]
#[error("payment gateway returned {status}")]
struct GatewayError {
    status: u16,
}

fn log_order(logger: &Logger) {
    logger.log_structured(
        LogLevel::Info,
        "order {order_id} placed by {customer}",
        props! {
            "order_id" => 1042,
            "customer" => "alice",
            "total" => 99.5,
            "express" => true,
        },
    );
    logger.log_structured_error(
        LogLevel::Error,
        "charging order {order_id} failed",
        props! { "order_id" => 1042 },
        &GatewayError { status: 502 },
    );
}

fn main() -> Result<()> {
    println!("=== batchlog - Structured Logging Example ===");

    for format in [OutputFormat::Text, OutputFormat::KeyValue, OutputFormat::Json] {
        println!("\n--- {:?} ---", format);
        let logger = Logger::new(
            LoggerConfig::default()
                .with_output_format(format)
                .with_structured_data(true)
                .with_colors(format == OutputFormat::Text),
        )?;
        log_order(&logger);
        logger.dispose();
    }

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
