//! File logging with size-based rotation
//!
//! Writes enough entries to roll the log file several times and lists the
//! rotated files that survive the retention limit.
//!
//! Run with: cargo run --example file_rotation

use batchlog::prelude::*;
use std::fs;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== batchlog - File Rotation Example ===\n");

    let dir = std::env::temp_dir().join("batchlog_rotation_demo");
    let _ = fs::remove_dir_all(&dir);

    let config = LoggerConfig::default()
        .with_console(false)
        .with_file(dir.join("demo.log"))
        .with_max_file_size(4 * 1024)
        .with_max_retained_files(3)
        .with_batch_size(50);

    let logger = Logger::new(config)?;
    for i in 0..1_000 {
        logger.info(format!("Processing record {:04}", i));
    }

    if !logger.shutdown(Duration::from_secs(5)) {
        eprintln!("Warning: logger shutdown timed out");
    }

    let metrics = logger.metrics();
    println!("Entries written: {}", metrics.written());
    println!("Batches flushed: {}", metrics.batches_flushed());
    println!("Rotations:       {}", metrics.rotations());

    println!("\nFiles in {}:", dir.display());
    let mut names: Vec<_> = fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    for name in names {
        let size = fs::metadata(dir.join(&name))?.len();
        println!("  {:<40} {:>6} bytes", name, size);
    }

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
