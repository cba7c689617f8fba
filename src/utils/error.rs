//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur while capturing a profile from an engine
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Profiling backend does not support {0}")]
    Unsupported(&'static str),

    #[error("Profiling backend '{0}' is not compiled into this build")]
    NotCompiled(&'static str),

    #[error("Sample frequency must be positive, got {0}")]
    InvalidSampleRate(i64),
}

/// Errors that can occur while decoding a flattened stack trace buffer
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Record at word {offset} is truncated (needs {needed} words, {available} left)")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Stack trace buffer is missing its zero-count terminator")]
    MissingTerminator,
}

/// Errors that can occur while loading symbols
#[derive(Error, Debug)]
pub enum SymbolizeError {
    #[error("Failed to read binary: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse object file: {0}")]
    Object(#[from] object::Error),

    #[error("Failed to load DWARF debug info: {0}")]
    Dwarf(#[from] gimli::Error),
}

/// Errors that can occur while loading a recorded profile
#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("Failed to read recording: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid recording JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid address in recording: {0}")]
    InvalidAddress(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
