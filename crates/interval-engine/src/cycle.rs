//! Recurring cycle windows anchored to an external base instant.
//!
//! Externally published datasets (aeronautical data on a 28-day cycle,
//! quarterly releases, ...) define their cycles by one known cycle start and
//! a repeat length. This module answers "which cycle contains this instant",
//! and "which cycle is N cycles away from it", without ever accumulating
//! drift: every endpoint is computed directly from the base, never from a
//! previously computed window.
//!
//! # Functions
//!
//! - [`julian_day`] — Julian Day Number of the UTC day containing an instant
//! - [`cycle_interval`] — fixed-length cycles counted in days
//! - [`period_interval`] — cycles in calendar units (day/week/month/quarter/year)

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::interval::{format_instant, Interval};
use crate::zone::{localize, parse_instant, parse_timezone};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Julian Day Number of 1970-01-01 (the Unix epoch day), floored.
const JULIAN_DAY_AT_UNIX_EPOCH: i64 = 2_440_587;

// ── Units and periodicities ─────────────────────────────────────────────────

/// A calendar unit in which cycle lengths and calendar windows are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarUnit {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl CalendarUnit {
    fn span(self) -> UnitSpan {
        match self {
            CalendarUnit::Day => UnitSpan::Days(1),
            CalendarUnit::Week => UnitSpan::Days(7),
            CalendarUnit::Month => UnitSpan::Months(1),
            CalendarUnit::Quarter => UnitSpan::Months(3),
            CalendarUnit::Year => UnitSpan::Months(12),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CalendarUnit::Day => "day",
            CalendarUnit::Week => "week",
            CalendarUnit::Month => "month",
            CalendarUnit::Quarter => "quarter",
            CalendarUnit::Year => "year",
        }
    }
}

/// Fixed-length (days) versus variable-length (months) calendar units.
#[derive(Debug, Clone, Copy)]
enum UnitSpan {
    Days(i64),
    Months(i64),
}

impl fmt::Display for CalendarUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CalendarUnit {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "day" | "days" => Ok(CalendarUnit::Day),
            "week" | "weeks" => Ok(CalendarUnit::Week),
            "month" | "months" => Ok(CalendarUnit::Month),
            "quarter" | "quarters" => Ok(CalendarUnit::Quarter),
            "year" | "years" => Ok(CalendarUnit::Year),
            other => Err(EngineError::InvalidInput(format!(
                "unknown calendar unit: '{}'",
                other
            ))),
        }
    }
}

/// A repeat length: `count` consecutive calendar `unit`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodDuration {
    pub unit: CalendarUnit,
    pub count: u32,
}

impl PeriodDuration {
    pub fn new(unit: CalendarUnit, count: u32) -> Self {
        Self { unit, count }
    }

    pub fn days(count: u32) -> Self {
        Self::new(CalendarUnit::Day, count)
    }

    fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(EngineError::InvalidInput(format!(
                "period must span at least one {}",
                self.unit
            )));
        }
        Ok(())
    }
}

/// A cycle definition: the start of one known cycle plus the repeat length.
///
/// The base carries its zone; calendar arithmetic (midnights, "same day next
/// month") is performed in that zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PeriodicityRecord", into = "PeriodicityRecord")]
pub struct Periodicity {
    pub base: DateTime<Tz>,
    pub duration: PeriodDuration,
}

impl Periodicity {
    pub fn new(base: DateTime<Tz>, duration: PeriodDuration) -> Self {
        Self { base, duration }
    }
}

/// Wire form of [`Periodicity`]: an ISO base instant with an optional zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PeriodicityRecord {
    base: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    zone: Option<String>,
    duration: PeriodDuration,
}

impl TryFrom<PeriodicityRecord> for Periodicity {
    type Error = EngineError;

    fn try_from(record: PeriodicityRecord) -> Result<Self> {
        let tz = match record.zone.as_deref() {
            Some(zone) => parse_timezone(zone)?,
            None => Tz::UTC,
        };
        let base = parse_instant(&record.base, &tz)?;
        Ok(Periodicity::new(base, record.duration))
    }
}

impl From<Periodicity> for PeriodicityRecord {
    fn from(periodicity: Periodicity) -> Self {
        let tz = periodicity.base.timezone();
        PeriodicityRecord {
            base: format_instant(&periodicity.base),
            zone: (tz != Tz::UTC).then(|| tz.name().to_string()),
            duration: periodicity.duration,
        }
    }
}

// ── julian_day ──────────────────────────────────────────────────────────────

/// Julian Day Number of the UTC calendar day containing `instant`.
///
/// Equivalent to `floor(ms(startOfUTCDay) / 86_400_000 + 2_440_587.5)`.
/// Only meaningful for differences between two days.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use interval_engine::julian_day;
///
/// let instant = Utc.with_ymd_and_hms(2023, 4, 20, 0, 0, 0).unwrap();
/// assert_eq!(julian_day(&instant), 2_460_054);
/// ```
pub fn julian_day<T: TimeZone>(instant: &DateTime<T>) -> i64 {
    let millis = instant.with_timezone(&Utc).timestamp_millis();
    millis.div_euclid(MILLIS_PER_DAY) + JULIAN_DAY_AT_UNIX_EPOCH
}

// ── cycle_interval ──────────────────────────────────────────────────────────

/// The fixed-length cycle containing `reference`, shifted by `offset` cycles.
///
/// Cycles are `length_days` days long and one of them starts at `base`.
/// The cycle index is `floor((jd(reference) - jd(base)) / length_days) + offset`
/// for every sign of the difference and the offset, so past and future
/// cycles follow the same formula.
///
/// # Errors
///
/// Returns [`EngineError::InvalidInput`] if `length_days < 1`, or if the
/// resulting cycle falls outside the representable date range.
pub fn cycle_interval(
    base: &DateTime<Tz>,
    length_days: i64,
    reference: &DateTime<Tz>,
    offset: i64,
) -> Result<Interval> {
    if length_days < 1 {
        return Err(EngineError::InvalidInput(format!(
            "cycle length must be at least one day, got {}",
            length_days
        )));
    }
    let diff = julian_day(&reference.with_timezone(&base.timezone())) - julian_day(base);
    let (from, to) = cycle_steps(diff.div_euclid(length_days), offset, length_days)?;
    let start = shift_local(base, CalendarUnit::Day, from)?;
    let end = shift_local(base, CalendarUnit::Day, to)?;
    Ok(Interval::spanning(start, end))
}

// ── period_interval ─────────────────────────────────────────────────────────

/// The calendar-unit cycle containing `reference`, shifted by `offset` cycles.
///
/// Whole units elapsed since `periodicity.base` are counted with calendar
/// arithmetic in the base's zone (so "one month" lands on the same day of
/// the next month regardless of its length), floored to whole cycles, and
/// the cycle endpoints are re-derived from the base by calendar addition.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use chrono_tz::Tz;
/// use interval_engine::{period_interval, PeriodDuration, Periodicity};
///
/// let base = DateTime::parse_from_rfc3339("2023-03-23T00:00:00Z").unwrap().with_timezone(&Tz::UTC);
/// let reference = DateTime::parse_from_rfc3339("2023-05-17T23:59:59.999Z").unwrap().with_timezone(&Tz::UTC);
/// let periodicity = Periodicity::new(base, PeriodDuration::days(28));
///
/// let interval = period_interval(&periodicity, &reference, 0).unwrap();
/// assert_eq!(interval.to_iso(), "2023-04-20T00:00:00.000Z/2023-05-18T00:00:00.000Z");
/// ```
///
/// # Errors
///
/// Returns [`EngineError::InvalidInput`] if the duration count is zero or the
/// resulting cycle falls outside the representable date range.
pub fn period_interval(
    periodicity: &Periodicity,
    reference: &DateTime<Tz>,
    offset: i64,
) -> Result<Interval> {
    let PeriodDuration { unit, count } = periodicity.duration;
    periodicity.duration.validate()?;
    let count = i64::from(count);
    let base = &periodicity.base;

    let elapsed = elapsed_units(base, reference, unit)?;
    let (from, to) = cycle_steps(elapsed.div_euclid(count), offset, count)?;
    let start = shift_local(base, unit, from)?;
    let end = shift_local(base, unit, to)?;
    Ok(Interval::spanning(start, end))
}

/// Unit offsets from the base to the start and end of cycle `cycle + offset`,
/// where each cycle is `step` units long.
fn cycle_steps(cycle: i64, offset: i64, step: i64) -> Result<(i64, i64)> {
    let out_of_range = || {
        EngineError::InvalidInput(format!(
            "cycle offset {} leaves the supported date range",
            offset
        ))
    };
    let index = cycle.checked_add(offset).ok_or_else(out_of_range)?;
    let from = index.checked_mul(step).ok_or_else(out_of_range)?;
    let to = from.checked_add(step).ok_or_else(out_of_range)?;
    Ok((from, to))
}

/// Whole `unit`s elapsed from `base` to `reference`: the largest `n` with
/// `base + n units <= reference` (negative when `reference` precedes `base`).
pub(crate) fn elapsed_units(
    base: &DateTime<Tz>,
    reference: &DateTime<Tz>,
    unit: CalendarUnit,
) -> Result<i64> {
    let local = reference.with_timezone(&base.timezone());
    let (from, to) = (base.date_naive(), local.date_naive());

    let mut estimate = match unit.span() {
        UnitSpan::Days(days) => (to - from).num_days().div_euclid(days),
        UnitSpan::Months(months) => (month_index(to) - month_index(from)).div_euclid(months),
    };

    // The estimate ignores day-of-month and time-of-day; correct it against
    // the actual calendar sums.
    while shift_local(base, unit, estimate)? > *reference {
        estimate -= 1;
    }
    while shift_local(base, unit, estimate + 1)? <= *reference {
        estimate += 1;
    }
    Ok(estimate)
}

/// Months since year 0 for `date`.
fn month_index(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

/// Shift a zoned instant by `amount` calendar units, keeping its local
/// wall-clock time of day.
pub(crate) fn shift_local(dt: &DateTime<Tz>, unit: CalendarUnit, amount: i64) -> Result<DateTime<Tz>> {
    let naive = dt.naive_local();
    let date = shift_date(naive.date(), unit, amount)?;
    Ok(localize(&dt.timezone(), date.and_time(naive.time())))
}

/// Shift a calendar date by `amount` units. Month-based shifts clamp to the
/// last day of a shorter target month.
pub(crate) fn shift_date(date: NaiveDate, unit: CalendarUnit, amount: i64) -> Result<NaiveDate> {
    let out_of_range = || {
        EngineError::InvalidInput(format!(
            "shifting {} by {} {}(s) leaves the supported date range",
            date, amount, unit
        ))
    };
    match unit.span() {
        UnitSpan::Days(days) => {
            let total = amount.checked_mul(days).ok_or_else(out_of_range)?;
            date.checked_add_signed(Duration::try_days(total).ok_or_else(out_of_range)?)
                .ok_or_else(out_of_range)
        }
        UnitSpan::Months(months) => {
            let total = amount.checked_mul(months).ok_or_else(out_of_range)?;
            let magnitude = u32::try_from(total.unsigned_abs()).map_err(|_| out_of_range())?;
            if total >= 0 {
                date.checked_add_months(Months::new(magnitude))
            } else {
                date.checked_sub_months(Months::new(magnitude))
            }
            .ok_or_else(out_of_range)
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Tz> {
        DateTime::parse_from_rfc3339(s)
            .unwrap()
            .with_timezone(&Tz::UTC)
    }

    fn nasr_cycle() -> Periodicity {
        Periodicity::new(utc("2023-03-23T00:00:00Z"), PeriodDuration::days(28))
    }

    fn quarterly() -> Periodicity {
        Periodicity::new(
            utc("2023-01-01T00:00:00.000Z"),
            PeriodDuration::new(CalendarUnit::Quarter, 1),
        )
    }

    // ── julian_day tests ────────────────────────────────────────────────

    #[test]
    fn test_julian_day_at_end_of_day() {
        assert_eq!(julian_day(&utc("2023-04-19T23:59:59.999Z")), 2_460_053);
    }

    #[test]
    fn test_julian_day_at_start_of_day() {
        assert_eq!(julian_day(&utc("2023-04-20T00:00:00Z")), 2_460_054);
    }

    #[test]
    fn test_julian_day_uses_utc_day_not_local_day() {
        // 20:00 CDT on Apr 19 is already Apr 20 in UTC.
        let chicago: Tz = "America/Chicago".parse().unwrap();
        let local = utc("2023-04-20T01:00:00Z").with_timezone(&chicago);
        assert_eq!(julian_day(&local), 2_460_054);
    }

    #[test]
    fn test_julian_day_before_unix_epoch() {
        assert_eq!(julian_day(&utc("1969-12-31T23:59:59Z")), 2_440_586);
        assert_eq!(julian_day(&utc("1970-01-01T00:00:00Z")), 2_440_587);
    }

    // ── cycle_interval tests ────────────────────────────────────────────

    #[test]
    fn test_cycle_interval_current() {
        let interval = cycle_interval(
            &utc("2023-03-23T00:00:00Z"),
            28,
            &utc("2023-05-17T23:59:59.999Z"),
            0,
        )
        .unwrap();
        assert_eq!(
            interval.to_iso(),
            "2023-04-20T00:00:00.000Z/2023-05-18T00:00:00.000Z"
        );
    }

    #[test]
    fn test_cycle_interval_negative_and_positive_offsets() {
        let base = utc("2023-03-23T00:00:00Z");
        let reference = utc("2023-05-10T00:00:00Z");
        assert_eq!(
            cycle_interval(&base, 28, &reference, -5).unwrap().to_iso(),
            "2022-12-01T00:00:00.000Z/2022-12-29T00:00:00.000Z"
        );
        assert_eq!(
            cycle_interval(&base, 28, &reference, 5).unwrap().to_iso(),
            "2023-09-07T00:00:00.000Z/2023-10-05T00:00:00.000Z"
        );
    }

    #[test]
    fn test_cycle_interval_huge_offset_is_rejected() {
        let base = utc("2023-03-23T00:00:00Z");
        for offset in [i64::MAX / 2, i64::MAX - 1, i64::MIN / 2, i64::MIN] {
            let result = cycle_interval(&base, 28, &base, offset);
            assert!(
                matches!(result, Err(EngineError::InvalidInput(_))),
                "offset {} gave {:?}",
                offset,
                result
            );
        }
    }

    #[test]
    fn test_cycle_interval_reference_before_base() {
        let interval = cycle_interval(
            &utc("2023-03-23T00:00:00Z"),
            28,
            &utc("2023-03-22T12:00:00Z"),
            0,
        )
        .unwrap();
        assert_eq!(
            interval.to_iso(),
            "2023-02-23T00:00:00.000Z/2023-03-23T00:00:00.000Z"
        );
    }

    #[test]
    fn test_cycle_interval_rejects_zero_length() {
        let base = utc("2023-03-23T00:00:00Z");
        let err = cycle_interval(&base, 0, &base, 0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    // ── period_interval tests ───────────────────────────────────────────

    #[test]
    fn test_period_interval_days_default_offset() {
        let interval =
            period_interval(&nasr_cycle(), &utc("2023-05-17T23:59:59.999Z"), 0).unwrap();
        assert_eq!(
            interval.to_iso(),
            "2023-04-20T00:00:00.000Z/2023-05-18T00:00:00.000Z"
        );
    }

    #[test]
    fn test_period_interval_days_negative_offset() {
        let interval = period_interval(&nasr_cycle(), &utc("2023-05-10T00:00:00Z"), -5).unwrap();
        assert_eq!(
            interval.to_iso(),
            "2022-12-01T00:00:00.000Z/2022-12-29T00:00:00.000Z"
        );
    }

    #[test]
    fn test_period_interval_days_positive_offset() {
        let interval = period_interval(&nasr_cycle(), &utc("2023-05-10T00:00:00Z"), 5).unwrap();
        assert_eq!(
            interval.to_iso(),
            "2023-09-07T00:00:00.000Z/2023-10-05T00:00:00.000Z"
        );
    }

    #[test]
    fn test_period_interval_quarters_default_offset() {
        let interval = period_interval(&quarterly(), &utc("2023-05-17T23:59:59.999Z"), 0).unwrap();
        assert_eq!(
            interval.to_iso(),
            "2023-04-01T00:00:00.000Z/2023-07-01T00:00:00.000Z"
        );
    }

    #[test]
    fn test_period_interval_quarters_negative_offset() {
        let interval = period_interval(&quarterly(), &utc("2023-05-10T00:00:00Z"), -5).unwrap();
        assert_eq!(
            interval.to_iso(),
            "2022-01-01T00:00:00.000Z/2022-04-01T00:00:00.000Z"
        );
    }

    #[test]
    fn test_period_interval_quarters_positive_offset() {
        let interval = period_interval(&quarterly(), &utc("2023-05-10T00:00:00Z"), 5).unwrap();
        assert_eq!(
            interval.to_iso(),
            "2024-07-01T00:00:00.000Z/2024-10-01T00:00:00.000Z"
        );
    }

    #[test]
    fn test_period_interval_huge_offset_is_rejected() {
        let base = utc("2023-01-01T00:00:00Z");
        for (periodicity, offset) in [
            (nasr_cycle(), i64::MAX / 2),
            (nasr_cycle(), i64::MAX - 1),
            (quarterly(), i64::MAX / 2),
            (quarterly(), i64::MAX - 1),
            (quarterly(), i64::MIN),
        ] {
            let result = period_interval(&periodicity, &base, offset);
            assert!(
                matches!(result, Err(EngineError::InvalidInput(_))),
                "offset {} gave {:?}",
                offset,
                result
            );
        }
    }

    #[test]
    fn test_period_interval_month_end_base_clamps() {
        // Monthly cycle based on Jan 31: Feb cycle starts on the 28th.
        let periodicity = Periodicity::new(
            utc("2023-01-31T00:00:00Z"),
            PeriodDuration::new(CalendarUnit::Month, 1),
        );
        let interval = period_interval(&periodicity, &utc("2023-03-01T00:00:00Z"), 0).unwrap();
        assert_eq!(
            interval.to_iso(),
            "2023-02-28T00:00:00.000Z/2023-03-31T00:00:00.000Z"
        );
    }

    #[test]
    fn test_period_interval_keeps_local_midnight_across_dst() {
        // Weekly cycle anchored at local midnight in Chicago straddling the
        // March 12 2023 spring-forward transition.
        let chicago: Tz = "America/Chicago".parse().unwrap();
        let base = utc("2023-03-05T06:00:00Z").with_timezone(&chicago);
        let periodicity = Periodicity::new(base, PeriodDuration::new(CalendarUnit::Week, 1));
        let interval = period_interval(&periodicity, &utc("2023-03-10T12:00:00Z"), 0).unwrap();
        assert_eq!(
            interval,
            Interval::new(utc("2023-03-05T06:00:00Z"), utc("2023-03-12T06:00:00Z")).unwrap()
        );
        let next = period_interval(&periodicity, &utc("2023-03-10T12:00:00Z"), 1).unwrap();
        assert_eq!(
            next,
            Interval::new(utc("2023-03-12T06:00:00Z"), utc("2023-03-19T05:00:00Z")).unwrap()
        );
    }

    #[test]
    fn test_period_interval_rejects_zero_count() {
        let periodicity = Periodicity::new(utc("2023-01-01T00:00:00Z"), PeriodDuration::days(0));
        let err = period_interval(&periodicity, &utc("2023-05-01T00:00:00Z"), 0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn test_periodicity_deserializes_from_record() {
        let periodicity: Periodicity = serde_json::from_str(
            r#"{"base": "2023-05-18T00:00:00Z", "duration": {"unit": "day", "count": 28}}"#,
        )
        .unwrap();
        assert_eq!(periodicity.base, utc("2023-05-18T00:00:00Z"));
        assert_eq!(periodicity.duration, PeriodDuration::days(28));
    }

    #[test]
    fn test_periodicity_with_zone_round_trips_zone_name() {
        let periodicity: Periodicity = serde_json::from_str(
            r#"{"base": "2023-01-01", "zone": "America/Chicago", "duration": {"unit": "month", "count": 1}}"#,
        )
        .unwrap();
        assert_eq!(periodicity.base, utc("2023-01-01T06:00:00Z"));
        let json = serde_json::to_value(&periodicity).unwrap();
        assert_eq!(json["zone"], "America/Chicago");
        assert_eq!(json["duration"]["unit"], "month");
    }

    #[test]
    fn test_calendar_unit_parses_plural_names() {
        assert_eq!("quarters".parse::<CalendarUnit>().unwrap(), CalendarUnit::Quarter);
        assert!("fortnight".parse::<CalendarUnit>().is_err());
    }
}
