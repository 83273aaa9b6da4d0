//! Scanning the raw modem byte stream for a `+<PREFIX>: ` reply.
//!
//! Expected reply shape:
//! ```text
//! +QLTS: "2023/10/07,23:07:16+08,1"\n
//! ```
//!
//! Two layers: [`FrameScanner`] is the pure state machine — one byte in per
//! call, so it can be fed from any source — and [`read_frame`] drives it
//! from a blocking reader under a wall-clock deadline.

use std::io::{ErrorKind, Read};
use std::mem;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Result, SyncError};

/// Default wall-clock budget for one scan.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default pause before retrying a read that returned no data.
pub const DEFAULT_READ_PAUSE: Duration = Duration::from_millis(1);
/// Default prefix accumulator capacity.
pub const DEFAULT_PREFIX_CAPACITY: usize = 32;
/// Default content buffer capacity.
pub const DEFAULT_CONTENT_CAPACITY: usize = 256;

/// Tuning knobs for [`read_frame`].
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Wall-clock budget for the whole scan, measured from scan start.
    pub timeout: Duration,
    /// Pause before retrying a read that returned no data.
    pub read_pause: Duration,
    /// Prefix accumulator capacity.
    pub prefix_capacity: usize,
    /// Content buffer capacity.
    pub content_capacity: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            read_pause: DEFAULT_READ_PAUSE,
            prefix_capacity: DEFAULT_PREFIX_CAPACITY,
            content_capacity: DEFAULT_CONTENT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Waiting for a `+` that might start a header.
    Idle,
    /// Accumulating header bytes up to the `:`.
    Prefix,
    /// Expecting the single space between `:` and the content.
    SepSpace,
    /// Capturing content up to the line terminator.
    Content,
}

/// Byte-at-a-time scanner for one `+<PREFIX>: <content>\n` frame.
///
/// Starts idle and stays resynchronizable: noise and non-matching `+FOO:`
/// headers drop back to idle, re-arming on the next `+`. Both accumulators
/// are capacity-checked; feeding more bytes than they hold yields
/// [`SyncError::BufferOverflow`], never truncation.
pub struct FrameScanner {
    expect: Vec<u8>,
    state: ScanState,
    prefix: Vec<u8>,
    content: Vec<u8>,
    prefix_capacity: usize,
    content_capacity: usize,
}

impl FrameScanner {
    /// Scanner for `+{expect}: ` headers with default capacities.
    pub fn new(expect: &str) -> Self {
        Self::with_capacity(expect, DEFAULT_PREFIX_CAPACITY, DEFAULT_CONTENT_CAPACITY)
    }

    /// Scanner with explicit accumulator capacities.
    pub fn with_capacity(expect: &str, prefix_capacity: usize, content_capacity: usize) -> Self {
        Self {
            expect: expect.as_bytes().to_vec(),
            state: ScanState::Idle,
            prefix: Vec::new(),
            content: Vec::new(),
            prefix_capacity,
            content_capacity,
        }
    }

    /// Feed one byte. Returns the captured content once the terminating
    /// `\n` arrives (terminator excluded, trailing `\r` stripped).
    pub fn push(&mut self, byte: u8) -> Result<Option<Vec<u8>>> {
        match self.state {
            ScanState::Idle => {
                if byte == b'+' {
                    self.prefix.clear();
                    self.state = ScanState::Prefix;
                }
            }
            ScanState::Prefix => {
                if byte == b':' {
                    // Exact length and content, or back to idle. The next
                    // `+` re-arms, so stray `+:` noise costs nothing.
                    self.state = if self.prefix == self.expect {
                        ScanState::SepSpace
                    } else {
                        ScanState::Idle
                    };
                } else {
                    if self.prefix.len() == self.prefix_capacity {
                        return Err(SyncError::BufferOverflow {
                            buffer: "prefix",
                            capacity: self.prefix_capacity,
                        });
                    }
                    self.prefix.push(byte);
                }
            }
            ScanState::SepSpace => {
                // Exactly one space after the matched `:`. Anything else
                // drops the candidate; the offending byte is consumed, not
                // re-scanned as a potential frame start.
                self.state = if byte == b' ' {
                    ScanState::Content
                } else {
                    ScanState::Idle
                };
            }
            ScanState::Content => {
                if byte == b'\n' {
                    if self.content.last() == Some(&b'\r') {
                        self.content.pop();
                    }
                    self.state = ScanState::Idle;
                    return Ok(Some(mem::take(&mut self.content)));
                }
                if self.content.len() == self.content_capacity {
                    return Err(SyncError::BufferOverflow {
                        buffer: "content",
                        capacity: self.content_capacity,
                    });
                }
                self.content.push(byte);
            }
        }
        Ok(None)
    }
}

/// Scan `reader` for a `+{expect}: ` frame and return the captured content.
///
/// Reads one byte at a time. A read yielding no data (`Ok(0)`,
/// `WouldBlock`, `TimedOut`, `Interrupted`) pauses for `opts.read_pause`
/// and retries without resetting the state machine; any other I/O error is
/// fatal. The deadline is checked before every read, so a silent or slow
/// stream fails with [`SyncError::Timeout`] regardless of scanner state.
pub fn read_frame(reader: &mut impl Read, expect: &str, opts: &ScanOptions) -> Result<Vec<u8>> {
    let mut scanner =
        FrameScanner::with_capacity(expect, opts.prefix_capacity, opts.content_capacity);
    let start = Instant::now();
    let mut byte = [0u8; 1];

    loop {
        if start.elapsed() > opts.timeout {
            return Err(SyncError::Timeout {
                budget: opts.timeout,
            });
        }
        match reader.read(&mut byte) {
            Ok(0) => thread::sleep(opts.read_pause),
            Ok(_) => {
                if let Some(frame) = scanner.push(byte[0])? {
                    return Ok(frame);
                }
            }
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) =>
            {
                thread::sleep(opts.read_pause);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    const REPLY: &[u8] = b"+QLTS: \"2023/10/07,23:07:16+08,1\"\n";
    const PAYLOAD: &[u8] = b"\"2023/10/07,23:07:16+08,1\"";

    /// Feed a whole slice, returning the first completed frame.
    fn feed(scanner: &mut FrameScanner, bytes: &[u8]) -> Result<Option<Vec<u8>>> {
        for &b in bytes {
            if let Some(frame) = scanner.push(b)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }

    fn quick_opts() -> ScanOptions {
        ScanOptions {
            timeout: Duration::from_millis(50),
            read_pause: Duration::from_millis(1),
            ..ScanOptions::default()
        }
    }

    #[test]
    fn captures_worked_example() {
        let mut scanner = FrameScanner::new("QLTS");
        let frame = feed(&mut scanner, REPLY).unwrap().unwrap();
        assert_eq!(frame, PAYLOAD);
    }

    #[test]
    fn strips_trailing_cr() {
        let mut scanner = FrameScanner::new("QLTS");
        let frame = feed(&mut scanner, b"+QLTS: payload\r\n").unwrap().unwrap();
        assert_eq!(frame, b"payload");
    }

    #[test]
    fn empty_content_is_captured_empty() {
        let mut scanner = FrameScanner::new("QLTS");
        let frame = feed(&mut scanner, b"+QLTS: \r\n").unwrap().unwrap();
        assert!(frame.is_empty());
    }

    #[test]
    fn recovers_from_prefixed_noise() {
        let mut data = b"\r\nOK\r\n+FOO:bar\n".to_vec();
        data.extend_from_slice(REPLY);
        let mut scanner = FrameScanner::new("QLTS");
        let frame = feed(&mut scanner, &data).unwrap().unwrap();
        assert_eq!(frame, PAYLOAD);
    }

    #[test]
    fn stray_plus_colon_rearms() {
        let mut data = b"+:".to_vec();
        data.extend_from_slice(REPLY);
        let mut scanner = FrameScanner::new("QLTS");
        let frame = feed(&mut scanner, &data).unwrap().unwrap();
        assert_eq!(frame, PAYLOAD);
    }

    #[test]
    fn wrong_prefix_never_captured() {
        let mut scanner = FrameScanner::new("QLTS");
        let out = feed(&mut scanner, b"+CCLK: \"23/10/07,23:07:16+08\"\n").unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn prefix_is_length_sensitive() {
        // "QLTSX" and "QLT" both differ from "QLTS" — neither matches.
        let mut scanner = FrameScanner::new("QLTS");
        let out = feed(&mut scanner, b"+QLTSX: a\n+QLT: b\n").unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn missing_space_drops_candidate() {
        let mut data = b"+QLTS:\"no-space\"\n".to_vec();
        data.extend_from_slice(REPLY);
        let mut scanner = FrameScanner::new("QLTS");
        let frame = feed(&mut scanner, &data).unwrap().unwrap();
        assert_eq!(frame, PAYLOAD);
    }

    #[test]
    fn separator_byte_is_not_reinterpreted() {
        // The `+` rejected in SEP_SPACE is consumed, so the following
        // "QLTS: ok" has no `+` of its own and never starts a frame.
        let mut scanner = FrameScanner::new("QLTS");
        let out = feed(&mut scanner, b"+QLTS:+QLTS: ok\n").unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn plus_inside_content_is_data() {
        let mut scanner = FrameScanner::new("QLTS");
        let frame = feed(&mut scanner, b"+QLTS: a+b:c\n").unwrap().unwrap();
        assert_eq!(frame, b"a+b:c");
    }

    #[test]
    fn prefix_overflow_is_an_error() {
        let mut scanner = FrameScanner::with_capacity("QLTS", 8, 64);
        let err = feed(&mut scanner, b"+ABCDEFGHIJKLMNOP: x\n").unwrap_err();
        assert!(matches!(
            err,
            SyncError::BufferOverflow {
                buffer: "prefix",
                capacity: 8
            }
        ));
    }

    #[test]
    fn content_overflow_is_an_error() {
        let mut scanner = FrameScanner::with_capacity("QLTS", 32, 4);
        let err = feed(&mut scanner, b"+QLTS: too long for four\n").unwrap_err();
        assert!(matches!(
            err,
            SyncError::BufferOverflow {
                buffer: "content",
                capacity: 4
            }
        ));
    }

    #[test]
    fn content_filling_capacity_exactly_is_ok() {
        let mut scanner = FrameScanner::with_capacity("QLTS", 32, 4);
        let frame = feed(&mut scanner, b"+QLTS: abcd\n").unwrap().unwrap();
        assert_eq!(frame, b"abcd");
    }

    #[test]
    fn read_frame_captures_after_noise() {
        let mut data = b"junk+FOO:bar\n".to_vec();
        data.extend_from_slice(REPLY);
        let mut reader = Cursor::new(data);
        let frame = read_frame(&mut reader, "QLTS", &quick_opts()).unwrap();
        assert_eq!(frame, PAYLOAD);
    }

    #[test]
    fn read_frame_times_out_on_silence() {
        let mut reader = Cursor::new(Vec::new());
        let err = read_frame(&mut reader, "QLTS", &quick_opts()).unwrap_err();
        assert!(matches!(err, SyncError::Timeout { .. }));
    }

    #[test]
    fn read_frame_times_out_on_partial_frame() {
        // Header matched but no terminator ever arrives: no partial content
        // escapes, only a timeout.
        let mut reader = Cursor::new(b"+QLTS: \"2023/10".to_vec());
        let err = read_frame(&mut reader, "QLTS", &quick_opts()).unwrap_err();
        assert!(matches!(err, SyncError::Timeout { .. }));
    }

    #[test]
    fn read_frame_surfaces_fatal_errors() {
        struct BrokenPort;
        impl io::Read for BrokenPort {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
            }
        }
        let err = read_frame(&mut BrokenPort, "QLTS", &quick_opts()).unwrap_err();
        assert!(matches!(err, SyncError::Io(_)));
    }
}
