//! Timestamps on the producer's custom epoch.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};

/// Seconds between the Unix epoch and 2001-01-01T00:00:00Z.
const EPOCH_OFFSET_SECS: i64 = 978_307_200;

/// Milliseconds since the Apple epoch (2001-01-01T00:00:00Z), as carried
/// by identity blocks and timestamp-formatted record fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AppleTimestamp(pub u64);

impl AppleTimestamp {
    pub const fn millis(self) -> u64 {
        self.0
    }

    /// Whole seconds since the Apple epoch.
    pub const fn seconds(self) -> u64 {
        self.0 / 1000
    }

    /// Sub-second remainder in microseconds.
    pub const fn micros(self) -> u64 {
        (self.0 % 1000) * 1000
    }

    /// Convert to a UTC timestamp on the Unix epoch. `None` for values
    /// outside the representable range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let secs = EPOCH_OFFSET_SECS.checked_add(i64::try_from(self.seconds()).ok()?)?;
        let nanos = u32::try_from(self.micros() * 1000).ok()?;
        Utc.timestamp_opt(secs, nanos).single()
    }
}

impl fmt::Display for AppleTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.6fZ")),
            None => write!(f, "+{}ms", self.0),
        }
    }
}
