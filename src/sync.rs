//! Driving one time-sync attempt: command writes, reply scan, field
//! delivery.
//!
//! One attempt runs to completion on the calling thread. Nothing is retried
//! here and no state survives between attempts; run-at-interval policy
//! belongs to the caller.

use std::io::{Read, Write};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::clock::ClockSink;
use crate::error::Result;
use crate::scan::{self, ScanOptions};
use crate::timestamp::{self, DateTimeFields};

/// Disable command echo so the reply scan only sees modem output.
pub const ECHO_OFF_CMD: &str = "ATE0\r\n";
/// Query the network-provided latest time, UTC variant.
pub const TIME_QUERY_CMD: &str = "AT+QLTS=1\r\n";
/// Reply header the scan accepts for the time query.
pub const TIME_PREFIX: &str = "QLTS";

/// Default settling pause after each command write.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(10);

/// Timing and buffering configuration for one sync attempt.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Wall-clock budget for the reply scan.
    pub response_timeout: Duration,
    /// Pause before retrying a read that returned no data.
    pub read_pause: Duration,
    /// Pause after each command write.
    pub settle_delay: Duration,
    /// Prefix accumulator capacity.
    pub prefix_capacity: usize,
    /// Content buffer capacity.
    pub content_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            response_timeout: scan::DEFAULT_TIMEOUT,
            read_pause: scan::DEFAULT_READ_PAUSE,
            settle_delay: DEFAULT_SETTLE_DELAY,
            prefix_capacity: scan::DEFAULT_PREFIX_CAPACITY,
            content_capacity: scan::DEFAULT_CONTENT_CAPACITY,
        }
    }
}

impl SyncConfig {
    fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            timeout: self.response_timeout,
            read_pause: self.read_pause,
            prefix_capacity: self.prefix_capacity,
            content_capacity: self.content_capacity,
        }
    }
}

/// Run one complete sync attempt against `port`.
///
/// Writes the echo-off and time-query commands with a settling pause after
/// each, scans for the `+QLTS` reply under the configured deadline,
/// validates and extracts the timestamp, and hands the fields to `clock`.
/// Returns the extracted fields on success.
///
/// Any scan or validation failure aborts the attempt before the clock is
/// touched. A `clock` failure is logged at `warn` and does not fail the
/// attempt.
pub fn perform_timesync<P>(
    port: &mut P,
    clock: &mut impl ClockSink,
    config: &SyncConfig,
) -> Result<DateTimeFields>
where
    P: Read + Write,
{
    write_command(port, ECHO_OFF_CMD, config.settle_delay)?;
    write_command(port, TIME_QUERY_CMD, config.settle_delay)?;

    let frame = scan::read_frame(port, TIME_PREFIX, &config.scan_options())?;
    debug!("captured reply: {}", String::from_utf8_lossy(&frame));

    timestamp::validate(&frame)?;
    let fields = timestamp::extract(&frame);
    debug!("parsed timestamp: {fields}");

    if let Err(e) = clock.set(&fields) {
        warn!("clock sink rejected {fields}: {e}");
    }
    Ok(fields)
}

fn write_command(port: &mut impl Write, command: &str, settle: Duration) -> Result<()> {
    debug!("sending {}", command.trim_end());
    port.write_all(command.as_bytes())?;
    port.flush()?;
    thread::sleep(settle);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
