use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors arising from a single time-sync attempt.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Fatal I/O error from the serial port. Transient "no data yet"
    /// conditions are absorbed by the scan loop and never surface here.
    #[error("serial I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("no matching reply within {budget:?}")]
    Timeout { budget: Duration },

    #[error("{buffer} buffer exceeded {capacity} bytes before a terminator")]
    BufferOverflow {
        buffer: &'static str,
        capacity: usize,
    },

    #[error("reply has wrong length (expected {expected} bytes, got {got})")]
    InvalidLength { expected: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, SyncError>;
