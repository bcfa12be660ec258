//! Zone parsing and local-time resolution helpers.
//!
//! Every calendar computation in this crate works on zone-local wall-clock
//! values (dates, midnights, "same time N months later") and then maps the
//! result back onto the absolute timeline. The mapping is where DST bites:
//! a local time can be skipped by a spring-forward transition or repeated by
//! a fall-back transition. [`localize`] resolves both cases deterministically
//! so the calendar arithmetic above it stays total.

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone,
};
use chrono_tz::Tz;

use crate::error::{EngineError, Result};

/// Parse an IANA timezone string into `Tz`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidTimezone`] if the name is not a known IANA zone.
pub fn parse_timezone(s: &str) -> Result<Tz> {
    s.trim()
        .parse::<Tz>()
        .map_err(|_| EngineError::InvalidTimezone(format!("'{}'", s)))
}

/// Parse an ISO 8601 timestamp into an instant in `tz`.
///
/// Accepted forms:
///
/// - RFC 3339 with an offset (`2023-03-17T12:34:56.789Z`, `2023-03-17T07:34:56-05:00`):
///   the instant is preserved and re-expressed in `tz`.
/// - Local date-time without an offset (`2023-03-17T07:34:56`, `2023-03-17T07:34`):
///   interpreted as wall-clock time in `tz`.
/// - Date only (`2023-03-17`): local midnight in `tz`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidDatetime`] if none of the forms match.
pub fn parse_instant(s: &str, tz: &Tz) -> Result<DateTime<Tz>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(tz));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(localize(tz, naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(start_of_day(tz, date));
    }
    Err(EngineError::InvalidDatetime(format!(
        "'{}': expected an ISO 8601 date or date-time",
        s
    )))
}

/// Map a zone-local wall-clock value onto the absolute timeline.
///
/// Repeated local times (fall-back) resolve to the earlier instant. Skipped
/// local times (spring-forward) are shifted forward by the length of the gap,
/// so 02:30 on a day that jumps from 02:00 to 03:00 becomes 03:30.
pub(crate) fn localize(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let before = tz
                .offset_from_utc_datetime(&(naive - Duration::days(1)))
                .fix()
                .local_minus_utc();
            tz.from_utc_datetime(&(naive - Duration::seconds(i64::from(before))))
        }
    }
}

/// Local midnight at the start of `date` in `tz`.
pub(crate) fn start_of_day(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    localize(tz, date.and_time(NaiveTime::MIN))
}

/// UTC offset of `dt` in minutes (negative west of Greenwich).
pub(crate) fn offset_minutes(dt: &DateTime<Tz>) -> i32 {
    dt.offset().fix().local_minus_utc() / 60
}
