//! The clock-set collaborator boundary.

use std::io;

use tracing::debug;

use crate::timestamp::DateTimeFields;

/// Applies six date/time fields as the host's current UTC time.
///
/// The sync core treats delivery as fire-and-forget: an implementation may
/// report failure, but [`perform_timesync`](crate::sync::perform_timesync)
/// only logs it.
pub trait ClockSink {
    fn set(&mut self, fields: &DateTimeFields) -> io::Result<()>;
}

/// Sets the host clock via `clock_settime(CLOCK_REALTIME)`.
///
/// Field range checking is inherited from the calendar conversion: an
/// impossible date such as month 13 fails here with `InvalidInput` rather
/// than being clamped. Requires `CAP_SYS_TIME` (or root).
#[cfg(unix)]
#[derive(Debug, Default)]
pub struct SystemClock;

#[cfg(unix)]
impl ClockSink for SystemClock {
    fn set(&mut self, fields: &DateTimeFields) -> io::Result<()> {
        use chrono::{TimeZone, Utc};

        let utc = Utc
            .with_ymd_and_hms(
                i32::from(fields.year),
                u32::from(fields.month),
                u32::from(fields.day),
                u32::from(fields.hour),
                u32::from(fields.minute),
                u32::from(fields.second),
            )
            .single()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("not a valid UTC date/time: {fields}"),
                )
            })?;

        let ts = libc::timespec {
            tv_sec: utc.timestamp() as libc::time_t,
            tv_nsec: 0,
        };
        // SAFETY: `ts` is a valid, initialized timespec for the duration
        // of the call.
        let rc = unsafe { libc::clock_settime(libc::CLOCK_REALTIME, &ts) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        debug!("system clock set to {utc}");
        Ok(())
    }
}
