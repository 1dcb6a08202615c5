use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type used across the entire application.
#[derive(Debug, Error)]
pub enum CpuWatchError {
    /// A process listed by the OS exited before its details could be read.
    #[error("process {pid} vanished during lookup")]
    TransientLookup { pid: u32 },

    /// Average requested on a window holding no samples.
    #[error("average requested on an empty window")]
    EmptyWindow,

    #[error("window capacity must be at least 1")]
    InvalidCapacity,

    #[error("process enumeration failed: {0}")]
    Enumeration(String),

    #[error("cannot read snapshot '{}': {reason}", path.display())]
    StoreRead { path: PathBuf, reason: String },

    #[error("cannot write snapshot '{}': {reason}", path.display())]
    StoreWrite { path: PathBuf, reason: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub type Result<T, E = CpuWatchError> = std::result::Result<T, E>;
