//! Half-open time intervals and plain date ranges.
//!
//! - [`Interval`] — zoned `[start, end)` span; `start <= end` is enforced at construction
//! - [`DateRange`] — plain UTC pair that may arrive reversed and is normalized before use

use std::fmt;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// A half-open span of time, `[start, end)`.
///
/// Equality and ordering of the endpoints are on the absolute timeline; two
/// intervals covering the same instants in different zones compare equal.
/// A zero-length interval (`start == end`) is valid and marks an
/// instantaneous transition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Interval {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
}

impl Interval {
    /// Create an interval from two instants.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if `end` is before `start`.
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> Result<Self> {
        if end < start {
            return Err(EngineError::InvalidInput(format!(
                "interval end {} is before start {}",
                format_instant(&end),
                format_instant(&start)
            )));
        }
        Ok(Self { start, end })
    }

    /// Create an interval from two UTC instants.
    pub fn from_utc(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        Self::new(start.with_timezone(&Tz::UTC), end.with_timezone(&Tz::UTC))
    }

    /// Internal constructor for endpoints that are ordered by construction.
    pub(crate) fn spanning(start: DateTime<Tz>, end: DateTime<Tz>) -> Self {
        debug_assert!(start <= end, "interval endpoints out of order");
        Self { start, end }
    }

    pub fn start(&self) -> &DateTime<Tz> {
        &self.start
    }

    pub fn end(&self) -> &DateTime<Tz> {
        &self.end
    }

    /// Elapsed time from start to end.
    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    pub fn length_millis(&self) -> i64 {
        self.end.timestamp_millis() - self.start.timestamp_millis()
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `instant` lies in `[start, end)`.
    pub fn contains(&self, instant: &DateTime<Tz>) -> bool {
        self.start <= *instant && *instant < self.end
    }

    /// Whether the two intervals share at least one instant.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether `other` overlaps this interval or begins exactly where it ends.
    pub(crate) fn touches(&self, other: &Interval) -> bool {
        other.start <= self.end && self.start <= other.end
    }

    /// The same instants expressed in another zone.
    pub fn with_timezone(&self, tz: &Tz) -> Interval {
        Interval {
            start: self.start.with_timezone(tz),
            end: self.end.with_timezone(tz),
        }
    }

    /// ISO 8601 interval notation, `start/end`, at millisecond precision.
    pub fn to_iso(&self) -> String {
        format!(
            "{}/{}",
            format_instant(&self.start),
            format_instant(&self.end)
        )
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso())
    }
}

impl Serialize for Interval {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut s = serializer.serialize_struct("Interval", 2)?;
        s.serialize_field("start", &format_instant(&self.start))?;
        s.serialize_field("end", &format_instant(&self.end))?;
        s.end()
    }
}

/// A plain `(start, end)` pair of UTC instants.
///
/// Unlike [`Interval`], a `DateRange` may be supplied reversed; the set
/// algebra functions normalize it before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The same range with endpoints in ascending order.
    pub fn normalized(self) -> Self {
        if self.start <= self.end {
            self
        } else {
            Self {
                start: self.end,
                end: self.start,
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl From<&Interval> for DateRange {
    fn from(interval: &Interval) -> Self {
        Self {
            start: interval.start.with_timezone(&Utc),
            end: interval.end.with_timezone(&Utc),
        }
    }
}

impl From<DateRange> for Interval {
    fn from(range: DateRange) -> Self {
        let range = range.normalized();
        Interval::spanning(
            range.start.with_timezone(&Tz::UTC),
            range.end.with_timezone(&Tz::UTC),
        )
    }
}

/// RFC 3339 at millisecond precision, `Z` for a zero offset.
pub fn format_instant(dt: &DateTime<Tz>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
