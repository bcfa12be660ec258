//! Zone-bound calendar windows.
//!
//! [`CalendarResolver`] answers "which window contains this instant" in one
//! IANA zone: unit-aligned windows (`all_of`), the rest of such a window
//! (`remainder_of`), named relative windows such as "next weekend"
//! (`resolve`), and the solar bands of a local day.
//!
//! All window arithmetic is done on local dates and midnights and mapped
//! back to absolute instants, so a local day on a DST transition is 23 or 25
//! hours long.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cycle::{period_interval, shift_date, CalendarUnit, PeriodDuration, Periodicity};
use crate::error::{EngineError, Result};
use crate::interval::Interval;
use crate::solar::{solar_intervals, GeoCoordinates, SolarIntervals};
use crate::zone::{parse_instant, parse_timezone, start_of_day};

// ── Configurable week start ─────────────────────────────────────────────────

/// Which day begins a week for week windows ("current week", `all_of(n, week)`).
///
/// Weekends are always Saturday and Sunday regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStartDay {
    /// US/Canada convention (Sunday = day 0 of the week).
    #[default]
    Sunday,
    /// ISO 8601 standard (Monday = day 0 of the week).
    Monday,
}

impl FromStr for WeekStartDay {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sunday" | "sun" => Ok(Self::Sunday),
            "monday" | "mon" => Ok(Self::Monday),
            other => Err(EngineError::InvalidInput(format!(
                "'{}' is not a supported week start (sunday, monday)",
                other
            ))),
        }
    }
}

/// Options for [`CalendarResolver::with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolveOptions {
    /// Which day starts the week for week windows.
    #[serde(default)]
    pub week_start: WeekStartDay,
}

/// How many days `weekday` is from the week-start day.
fn days_from_week_start(weekday: Weekday, week_start: WeekStartDay) -> i64 {
    match week_start {
        WeekStartDay::Monday => i64::from(weekday.num_days_from_monday()),
        WeekStartDay::Sunday => i64::from(weekday.num_days_from_sunday()),
    }
}

// ── Date windows ────────────────────────────────────────────────────────────

/// Position of a named window relative to the reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowOffset {
    Previous,
    Current,
    Next,
}

impl WindowOffset {
    fn cycles(self) -> i64 {
        match self {
            Self::Previous => -1,
            Self::Current => 0,
            Self::Next => 1,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Previous => "previous",
            Self::Current => "current",
            Self::Next => "next",
        }
    }
}

/// Extent of a named window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowSpan {
    Day,
    Week,
    Month,
    /// Saturday 00:00 to Monday 00:00, local time.
    Weekend,
}

impl WindowSpan {
    fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Weekend => "weekend",
        }
    }
}

/// A relative window such as "current week" or "previous weekend".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamedWindow {
    pub offset: WindowOffset,
    pub span: WindowSpan,
}

impl NamedWindow {
    pub const fn new(offset: WindowOffset, span: WindowSpan) -> Self {
        Self { offset, span }
    }
}

/// The twelve named windows, in the order of their tags.
pub const DATE_WINDOWS: [NamedWindow; 12] = [
    NamedWindow::new(WindowOffset::Current, WindowSpan::Day),
    NamedWindow::new(WindowOffset::Current, WindowSpan::Month),
    NamedWindow::new(WindowOffset::Current, WindowSpan::Week),
    NamedWindow::new(WindowOffset::Current, WindowSpan::Weekend),
    NamedWindow::new(WindowOffset::Next, WindowSpan::Day),
    NamedWindow::new(WindowOffset::Next, WindowSpan::Month),
    NamedWindow::new(WindowOffset::Next, WindowSpan::Week),
    NamedWindow::new(WindowOffset::Next, WindowSpan::Weekend),
    NamedWindow::new(WindowOffset::Previous, WindowSpan::Day),
    NamedWindow::new(WindowOffset::Previous, WindowSpan::Month),
    NamedWindow::new(WindowOffset::Previous, WindowSpan::Week),
    NamedWindow::new(WindowOffset::Previous, WindowSpan::Weekend),
];

impl fmt::Display for NamedWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.offset.as_str(), self.span.as_str())
    }
}

impl FromStr for NamedWindow {
    type Err = EngineError;

    /// Parse a tag like `"next weekend"`. Words may also be joined by `-` or `_`.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        let mut words = normalized.split_whitespace();
        let offset = match words.next() {
            Some("previous") | Some("last") => Some(WindowOffset::Previous),
            Some("current") | Some("this") => Some(WindowOffset::Current),
            Some("next") => Some(WindowOffset::Next),
            _ => None,
        };
        let span = match words.next() {
            Some("day") => Some(WindowSpan::Day),
            Some("week") => Some(WindowSpan::Week),
            Some("month") => Some(WindowSpan::Month),
            Some("weekend") => Some(WindowSpan::Weekend),
            _ => None,
        };
        match (offset, span, words.next()) {
            (Some(offset), Some(span), None) => Ok(NamedWindow { offset, span }),
            _ => Err(EngineError::InvalidInput(format!(
                "unknown date window '{}'",
                s
            ))),
        }
    }
}

/// Either a named relative window or a literal interval.
#[derive(Debug, Clone, PartialEq)]
pub enum DateWindow {
    Named(NamedWindow),
    Literal(Interval),
}

impl From<NamedWindow> for DateWindow {
    fn from(window: NamedWindow) -> Self {
        DateWindow::Named(window)
    }
}

impl From<Interval> for DateWindow {
    fn from(interval: Interval) -> Self {
        DateWindow::Literal(interval)
    }
}

// ── CalendarResolver ────────────────────────────────────────────────────────

/// Calendar window computations bound to one IANA zone.
///
/// Cheap to copy and free of interior state; one resolver can be shared by
/// any number of threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarResolver {
    tz: Tz,
    options: ResolveOptions,
}

impl CalendarResolver {
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTimezone`] if `zone` is not a known IANA zone.
    pub fn new(zone: &str) -> Result<Self> {
        Ok(Self::from_tz(parse_timezone(zone)?))
    }

    pub fn from_tz(tz: Tz) -> Self {
        Self::with_options(tz, ResolveOptions::default())
    }

    pub fn with_options(tz: Tz, options: ResolveOptions) -> Self {
        Self { tz, options }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn options(&self) -> ResolveOptions {
        self.options
    }

    /// Parse an ISO 8601 string into an instant in this zone.
    ///
    /// Strings with an offset keep their instant; offset-less strings are
    /// local wall-clock time in this zone.
    pub fn to_date_time(&self, iso: &str) -> Result<DateTime<Tz>> {
        parse_instant(iso, &self.tz)
    }

    /// The instant `millis` milliseconds after the Unix epoch, in this zone.
    pub fn from_millis(&self, millis: i64) -> Result<DateTime<Tz>> {
        DateTime::from_timestamp_millis(millis)
            .map(|utc| utc.with_timezone(&self.tz))
            .ok_or_else(|| {
                EngineError::InvalidInput(format!("{} ms is outside the supported range", millis))
            })
    }

    /// The same instant expressed in this zone.
    pub fn in_zone<T: TimeZone>(&self, instant: &DateTime<T>) -> DateTime<Tz> {
        instant.with_timezone(&self.tz)
    }

    /// The window of `count` consecutive `unit`s containing `instant`.
    ///
    /// Windows lie on a fixed grid anchored at local midnight of 1970-01-01
    /// (days, months, quarters, years) or at the start of the week containing
    /// that date (weeks), so successive windows tile the timeline and a
    /// multi-unit window does not move with `instant`.
    ///
    /// # Examples
    ///
    /// ```
    /// use interval_engine::{CalendarResolver, CalendarUnit};
    ///
    /// let chicago = CalendarResolver::new("America/Chicago").unwrap();
    /// let instant = chicago.to_date_time("2023-03-17T12:34:56.789Z").unwrap();
    /// let day = chicago.all_of(1, CalendarUnit::Day, &instant).unwrap();
    /// assert_eq!(day.to_iso(), "2023-03-17T00:00:00.000-05:00/2023-03-18T00:00:00.000-05:00");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if `count` is zero.
    pub fn all_of(&self, count: u32, unit: CalendarUnit, instant: &DateTime<Tz>) -> Result<Interval> {
        self.grid_window(count, unit, instant, 0)
    }

    /// From `instant` to the end of the [`all_of`](Self::all_of) window containing it.
    pub fn remainder_of(
        &self,
        count: u32,
        unit: CalendarUnit,
        instant: &DateTime<Tz>,
    ) -> Result<Interval> {
        let window = self.all_of(count, unit, instant)?;
        Ok(Interval::spanning(self.in_zone(instant), *window.end()))
    }

    /// Resolve a window to a concrete interval relative to `reference`.
    ///
    /// Literal intervals are returned unchanged. Day, week and month windows
    /// are the grid windows containing `reference`, or the adjacent ones.
    /// Weekend windows:
    ///
    /// - *current*: the weekend containing `reference`, else the next one to start
    /// - *previous*: the last weekend completed before `reference`; while a
    ///   weekend is in progress, the one before it
    /// - *next*: the weekend after the current one
    pub fn resolve(&self, window: &DateWindow, reference: &DateTime<Tz>) -> Result<Interval> {
        let named = match window {
            DateWindow::Literal(interval) => return Ok(interval.clone()),
            DateWindow::Named(named) => *named,
        };
        let cycles = named.offset.cycles();
        let interval = match named.span {
            WindowSpan::Day => self.grid_window(1, CalendarUnit::Day, reference, cycles)?,
            WindowSpan::Week => self.grid_window(1, CalendarUnit::Week, reference, cycles)?,
            WindowSpan::Month => self.grid_window(1, CalendarUnit::Month, reference, cycles)?,
            WindowSpan::Weekend => self.weekend(named.offset, reference)?,
        };
        debug!("Resolved '{}' at {} to {}", named, reference, interval);
        Ok(interval)
    }

    /// Parse `tag` as a [`NamedWindow`] and [`resolve`](Self::resolve) it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] for an unknown tag.
    pub fn resolve_str(&self, tag: &str, reference: &DateTime<Tz>) -> Result<Interval> {
        let named: NamedWindow = tag.parse()?;
        self.resolve(&DateWindow::Named(named), reference)
    }

    /// Solar bands of the local calendar day containing `instant`.
    pub fn solar_intervals(
        &self,
        instant: &DateTime<Tz>,
        coords: &GeoCoordinates,
    ) -> Result<SolarIntervals> {
        solar_intervals(&self.tz, self.local_date(instant), coords)
    }

    // ── internals ───────────────────────────────────────────────────────

    fn local_date<T: TimeZone>(&self, instant: &DateTime<T>) -> NaiveDate {
        self.in_zone(instant).date_naive()
    }

    /// Local midnight from which `unit` windows are counted.
    fn grid_origin(&self, unit: CalendarUnit) -> DateTime<Tz> {
        let epoch = DateTime::<Utc>::UNIX_EPOCH.date_naive();
        let origin = match unit {
            CalendarUnit::Week => {
                let back = days_from_week_start(epoch.weekday(), self.options.week_start);
                epoch - chrono::Duration::days(back)
            }
            _ => epoch,
        };
        start_of_day(&self.tz, origin)
    }

    fn grid_window(
        &self,
        count: u32,
        unit: CalendarUnit,
        instant: &DateTime<Tz>,
        offset: i64,
    ) -> Result<Interval> {
        let grid = Periodicity::new(self.grid_origin(unit), PeriodDuration::new(unit, count));
        period_interval(&grid, &self.in_zone(instant), offset)
    }

    fn weekend(&self, offset: WindowOffset, reference: &DateTime<Tz>) -> Result<Interval> {
        let date = self.local_date(reference);
        let from_monday = i64::from(date.weekday().num_days_from_monday());
        let saturday_shift = match offset {
            // Saturday before the Monday that starts this ISO week.
            WindowOffset::Previous => -from_monday - 2,
            WindowOffset::Current if date.weekday() == Weekday::Sun => -1,
            WindowOffset::Current => 5 - from_monday,
            WindowOffset::Next if date.weekday() == Weekday::Sun => 6,
            WindowOffset::Next => 12 - from_monday,
        };
        let saturday = shift_date(date, CalendarUnit::Day, saturday_shift)?;
        let monday = shift_date(saturday, CalendarUnit::Day, 2)?;
        Ok(Interval::spanning(
            start_of_day(&self.tz, saturday),
            start_of_day(&self.tz, monday),
        ))
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
