//! Network time synchronization from a cellular modem over AT commands.
//!
//! Polls the modem with `AT+QLTS=1`, scans the raw serial stream for the
//! `+QLTS: "..."` reply under a wall-clock deadline, validates and extracts
//! the six date/time fields, and hands them to a [`ClockSink`].

pub mod clock;
pub mod error;
pub mod scan;
pub mod sync;
pub mod timestamp;

pub use clock::ClockSink;
#[cfg(unix)]
pub use clock::SystemClock;
pub use error::SyncError;
pub use scan::{FrameScanner, ScanOptions};
pub use sync::{perform_timesync, SyncConfig};
pub use timestamp::DateTimeFields;
