//! Error types for the simulator.
//!
//! Three variants correspond to the three places a run can fail:
//! configuration validation, process-file loading, and runtime faults
//! surfaced by the engine or memory manager.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type SimResult<T> = Result<T, SimError>;

/// Top-level error type returned by every fallible public entry point.
#[derive(Error, Debug)]
pub enum SimError {
    /// Configuration failed validation before an engine was constructed.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The process-definition file could not be loaded.
    #[error("failed to load process definitions: {0}")]
    Load(#[from] LoadError),

    /// A runtime fault occurred while the engine was executing.
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

/// Configuration validation failures, raised at `Config` construction.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("total_frames must be >= 1, got {0}")]
    InvalidFrameCount(usize),

    #[error("quantum must be >= 1, got {0}")]
    InvalidQuantum(u64),

    #[error("unknown scheduler kind: {0}")]
    UnknownScheduler(String),

    #[error("unknown replacement policy: {0}")]
    UnknownReplacement(String),

    #[error("process file path does not exist: {0}")]
    MissingProcessFile(String),
}

/// Failures while parsing a process-definition file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("could not read process file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: invalid numeric field: {reason}")]
    NumericField { line: usize, reason: String },

    #[error("line {line}: burst list is empty")]
    EmptyBurstList { line: usize },

    #[error("no processes were loaded from {path}")]
    Empty { path: String },
}

/// Faults surfaced by the engine or memory manager while running.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("engine mutex poisoned")]
    EnginePoisoned,

    #[error("memory manager mutex poisoned")]
    MemoryPoisoned,

    #[error("simulation exceeded max_ticks bound of {0} without terminating")]
    MaxTicksExceeded(u64),
}

/// Extracts a human-readable message from a `catch_unwind` payload, for
/// logging at the boundary where caller-supplied callbacks are suppressed.
pub(crate) fn describe_panic(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
