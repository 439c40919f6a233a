//! Sink implementations for the console and the rotating log file

pub mod console;
pub mod file;
pub mod rotation;

pub use console::ConsoleSink;
pub use file::{FileCursor, FileSink};
pub use rotation::{PruneReport, RotationManager, MAX_NAME_ATTEMPTS};
