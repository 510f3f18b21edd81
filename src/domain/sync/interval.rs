//! Interval value object

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::error::IntervalParseError;

/// Default clipboard poll interval (500 milliseconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Default delay between reconnect attempts (5 seconds)
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5_000;

/// A positive time interval used for polling and retry timing.
/// Immutable and validated on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Interval {
    milliseconds: u64,
}

impl Interval {
    pub const fn from_millis(ms: u64) -> Self {
        Self { milliseconds: ms }
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self {
            milliseconds: secs * 1000,
        }
    }

    pub const fn default_poll() -> Self {
        Self::from_millis(DEFAULT_POLL_INTERVAL_MS)
    }

    pub const fn default_reconnect() -> Self {
        Self::from_millis(DEFAULT_RECONNECT_DELAY_MS)
    }

    pub const fn as_millis(&self) -> u64 {
        self.milliseconds
    }

    /// Convert to std::time::Duration
    pub const fn as_std(&self) -> Duration {
        Duration::from_millis(self.milliseconds)
    }
}

impl From<Interval> for Duration {
    fn from(interval: Interval) -> Self {
        interval.as_std()
    }
}

impl FromStr for Interval {
    type Err = IntervalParseError;

    /// Parse strings such as "500ms", "5s", "1m" and "1m30s".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || IntervalParseError {
            input: s.to_string(),
        };
        let input = s.trim().to_lowercase();

        let mut total_ms: u64 = 0;
        let mut current_num = String::new();
        let mut found_any = false;
        let mut chars = input.chars().peekable();

        while let Some(ch) = chars.next() {
            if ch.is_ascii_digit() {
                current_num.push(ch);
                continue;
            }
            if current_num.is_empty() {
                return Err(err());
            }
            let value: u64 = current_num.parse().map_err(|_| err())?;
            let unit_ms = match ch {
                'm' if chars.peek() == Some(&'s') => {
                    chars.next();
                    1
                }
                'm' => 60_000,
                's' => 1_000,
                _ => return Err(err()),
            };
            total_ms = value
                .checked_mul(unit_ms)
                .and_then(|v| total_ms.checked_add(v))
                .ok_or_else(err)?;
            current_num.clear();
            found_any = true;
        }

        if !current_num.is_empty() || !found_any || total_ms == 0 {
            return Err(err());
        }

        Ok(Self {
            milliseconds: total_ms,
        })
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.milliseconds;
        if ms % 1000 != 0 {
            return write!(f, "{}ms", ms);
        }

        let total_secs = ms / 1000;
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;

        if minutes == 0 {
            write!(f, "{}s", seconds)
        } else if seconds == 0 {
            write!(f, "{}m", minutes)
        } else {
            write!(f, "{}m{}s", minutes, seconds)
        }
    }
}
