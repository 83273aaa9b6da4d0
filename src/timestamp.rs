//! Validation and field extraction for the `+QLTS` timestamp payload.
//!
//! Payload layout, quotes included, offsets relative to the opening quote:
//! ```text
//! "2023/10/07,23:07:16+08,1"
//!  ^    ^  ^  ^  ^  ^
//!  1    6  9  12 15 18
//! ```
//! The zone offset (`+08`) and DST flag (`,1`) are discarded.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// Exact byte length of the quoted literal `"YYYY/MM/DD,HH:MM:SS+ZZ,F"`,
/// both quotes included.
pub const RESPONSE_LEN: usize = 26;

/// Fixed (offset, width) of each numeric field, in struct order.
const FIELDS: [(usize, usize); 6] = [
    (1, 4),  // year
    (6, 2),  // month
    (9, 2),  // day
    (12, 2), // hour
    (15, 2), // minute
    (18, 2), // second
];

/// The six date/time fields reported by the modem, UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DateTimeFields {
    pub year: u16,
    pub month: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
}

impl fmt::Display for DateTimeFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Check that a captured frame has the exact expected length.
///
/// A length check only, not a grammar check: a 25-byte payload with
/// different punctuation passes and extracts garbage fields. Callers
/// wanting stronger guarantees must validate the extracted values
/// themselves.
pub fn validate(frame: &[u8]) -> Result<()> {
    if frame.len() != RESPONSE_LEN {
        return Err(SyncError::InvalidLength {
            expected: RESPONSE_LEN,
            got: frame.len(),
        });
    }
    Ok(())
}

/// Extract the six fields from a validated frame.
///
/// Pure and total: substrings that fall outside the frame or fail to parse
/// as base-10 yield 0. No range validation is applied, so a month of 13
/// passes through as-is.
pub fn extract(frame: &[u8]) -> DateTimeFields {
    let [year, month, day, hour, minute, second] =
        FIELDS.map(|(offset, width)| parse_field(frame, offset, width));
    DateTimeFields {
        year,
        month,
        day,
        hour,
        minute,
        second,
    }
}

fn parse_field(frame: &[u8], offset: usize, width: usize) -> u16 {
    frame
        .get(offset..offset + width)
        .and_then(|raw| std::str::from_utf8(raw).ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
