#![forbid(unsafe_code)]

//! Leveled console and file logging with indented blocks.
//!
//! This crate provides:
//! - The six fixed severities and threshold filtering
//! - Line formatting (channel tag, timestamp, prefix, label, indentation)
//! - Payload rendering for text, structured values and errors
//! - A stateful `Logger` with enter/exit block indentation
//! - Console, in-memory and append-mode file sinks

pub mod level;
pub mod error;
pub mod payload;
pub mod format;
pub mod style;
pub mod sink;
pub mod file;
pub mod config;
pub mod logging;
pub mod logger;

// Re-export commonly used types
pub use error::{Error, Result};
pub use level::{validate, Channel, Severity};
pub use payload::{Payload, Payloads};
pub use config::LoggerConfig;
pub use sink::{Console, MemorySink, OutStream};
pub use file::FileSink;
pub use logger::{Logger, SharedLogger, WriteOptions, BLOCK_INDENT};
