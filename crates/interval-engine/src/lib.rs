//! # interval-engine
//!
//! Zone-aware interval and cycle calculus.
//!
//! Computes calendar-aligned windows in an IANA zone, named relative windows
//! ("current week", "next weekend"), recurring publication cycles anchored to
//! an external base instant, solar day/twilight/night bands for a location
//! and date, and set algebra over collections of intervals. Every operation
//! is a pure function of its explicit inputs; nothing reads the system clock.
//!
//! ## Modules
//!
//! - [`interval`] — Half-open `[start, end)` intervals and plain date ranges
//! - [`cycle`] — Julian day numbers, fixed-length and calendar-unit cycles
//! - [`algebra`] — Gaps, transitions and fractional positions over interval sets
//! - [`calendar`] — Zone-bound window resolution (`all_of`, `resolve`, ...)
//! - [`solar`] — Sunrise, sunset and twilight bands, with an optional cache
//! - [`segments`] — Proportional division of a period into segments and gaps
//! - [`math`] — Rounding and truncation helpers
//! - [`zone`] — Zone and timestamp parsing
//! - [`error`] — Error types

pub mod algebra;
pub mod calendar;
pub mod cycle;
pub mod error;
pub mod interval;
pub mod math;
pub mod segments;
pub mod solar;
pub mod zone;

pub use algebra::{
    collapsed_ranges, excluded_ranges, merge_intervals, normalized_range, to_fractions,
    to_length_fractions, to_transitions,
};
pub use calendar::{
    CalendarResolver, DateWindow, NamedWindow, ResolveOptions, WeekStartDay, WindowOffset,
    WindowSpan, DATE_WINDOWS,
};
pub use cycle::{
    cycle_interval, julian_day, period_interval, CalendarUnit, PeriodDuration, Periodicity,
};
pub use error::{EngineError, Result};
pub use interval::{format_instant, DateRange, Interval};
pub use math::{percent, scale, truncate};
pub use segments::{period_segments, PeriodSegment, Segment};
pub use solar::{
    solar_intervals, solar_times, GeoCoordinates, SolarCache, SolarIntervals, SolarPhase,
    SolarTimes,
};
pub use zone::{parse_instant, parse_timezone};
