//! # Telegram Logging Utilities
//!
//! A P1 meter sends a full telegram every second (DSMR 5) and each one is
//! 20 to 40 lines long. Logging all of them floods the output, so
//! [`TelegramLineLog`] shows a rotating window of lines per telegram: lines
//! 1-10 of the first telegram, 11-20 of the next, and so on, wrapping back to
//! the top once the window passes the end of the telegram.
//!
//! The window wraps the parser's line iterator, so the parser itself stays
//! free of logging state.
//!
//! ```rust
//! use p1_dsmr::dsmr::telegram::{lines, parse_lines};
//! use p1_dsmr::util::logging::TelegramLineLog;
//!
//! let mut line_log = TelegramLineLog::new(10);
//! let body = b"/ISk5\\2MT382-1000\r\n1-0:1.8.0(00001.234*kWh)\r\n!";
//! let telegram = parse_lines(line_log.observe(lines(body)));
//! line_log.advance(telegram.lines);
//! assert_eq!(telegram.readings.len(), 1);
//! ```

use crate::constants::LOG_LINES_PER_PARSE;
use crate::dsmr::telegram::TelegramLine;
use std::ops::RangeInclusive;

/// Rotating window over telegram line numbers.
#[derive(Debug, Clone)]
pub struct TelegramLineLog {
    lines_per_parse: usize,
    /// Lines before the window (0 = window starts at line 1).
    start: usize,
}

impl Default for TelegramLineLog {
    fn default() -> Self {
        Self::new(LOG_LINES_PER_PARSE)
    }
}

impl TelegramLineLog {
    pub fn new(lines_per_parse: usize) -> Self {
        Self {
            lines_per_parse,
            start: 0,
        }
    }

    /// 1-based line numbers logged for the next telegram.
    pub fn window(&self) -> RangeInclusive<usize> {
        (self.start + 1)..=(self.start + self.lines_per_parse)
    }

    /// Wrap a line iterator so that lines inside the window are logged at
    /// debug level as they pass through.
    pub fn observe<'a, I>(&self, lines: I) -> ObservedLines<I>
    where
        I: Iterator<Item = TelegramLine<'a>>,
    {
        ObservedLines {
            inner: lines,
            window: self.window(),
        }
    }

    /// Move the window past the telegram that was just logged.
    pub fn advance(&mut self, total_lines: usize) {
        if total_lines == 0 {
            return;
        }
        self.start += self.lines_per_parse;
        if self.start >= total_lines {
            self.start = 0;
        }
    }
}

/// Line iterator decorated by [`TelegramLineLog::observe`].
#[derive(Debug)]
pub struct ObservedLines<I> {
    inner: I,
    window: RangeInclusive<usize>,
}

impl<'a, I> Iterator for ObservedLines<I>
where
    I: Iterator<Item = TelegramLine<'a>>,
{
    type Item = TelegramLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.inner.next()?;
        if self.window.contains(&line.number) {
            log::debug!(
                target: "p1_dsmr::telegram",
                "Telegram line {}: {}",
                line.number,
                String::from_utf8_lossy(line.text).trim_end()
            );
        }
        Some(line)
    }
}

/// Log the start of a frame for diagnosis, bounded to 64 bytes.
pub fn log_frame_preview(prefix: &str, data: &[u8]) {
    const MAX_LOG_BYTES: usize = 64;

    let shown = &data[..data.len().min(MAX_LOG_BYTES)];
    let suffix = if data.len() > MAX_LOG_BYTES {
        format!(" ... ({} bytes total)", data.len())
    } else {
        String::new()
    };
    log::debug!("{prefix}: {:?}{suffix}", String::from_utf8_lossy(shown));
}
