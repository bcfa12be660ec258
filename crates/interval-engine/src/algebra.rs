//! Set algebra over collections of ranges and intervals.
//!
//! Zone-agnostic: everything here compares instants on the absolute
//! timeline.
//!
//! # Functions
//!
//! - [`normalized_range`] — put a possibly-reversed range in ascending order
//! - [`collapsed_ranges`] — sort and merge overlapping or abutting ranges
//! - [`excluded_ranges`] — gaps left inside a bounding range
//! - [`merge_intervals`] — sort and merge overlapping or abutting intervals
//! - [`to_transitions`] — boundaries between covered and uncovered time
//! - [`to_fractions`] — position of instants within an interval, in `[0, 1]`
//! - [`to_length_fractions`] — relative lengths of the pieces of a split interval

use chrono::DateTime;
use chrono_tz::Tz;

use crate::error::{EngineError, Result};
use crate::interval::{format_instant, DateRange, Interval};

// ── Ranges ──────────────────────────────────────────────────────────────────

/// Normalize a date range, swapping its endpoints if they are reversed.
pub fn normalized_range(range: DateRange) -> DateRange {
    range.normalized()
}

/// Collapse overlapping and abutting ranges.
///
/// Every range is normalized first; the result is sorted by start and
/// contains no two ranges that overlap or touch.
pub fn collapsed_ranges(ranges: &[DateRange]) -> Vec<DateRange> {
    let mut sorted: Vec<DateRange> = ranges.iter().copied().map(normalized_range).collect();
    sorted.sort_by_key(|range| range.start);

    let mut collapsed: Vec<DateRange> = Vec::with_capacity(sorted.len());
    for next in sorted {
        match collapsed.last_mut() {
            Some(previous) if next.start <= previous.end => {
                if next.end > previous.end {
                    previous.end = next.end;
                }
            }
            _ => collapsed.push(next),
        }
    }
    collapsed
}

/// Given a `bounds` range and the `included` ranges, return the excluded
/// ranges: the gaps inside `bounds` not covered by any included range.
///
/// Included ranges outside `bounds` contribute nothing and ranges straddling
/// an edge of `bounds` are clipped. Zero-length gaps are dropped. Useful for
/// finding the open slots of a schedule.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use interval_engine::{excluded_ranges, DateRange};
///
/// let at = |h| Utc.with_ymd_and_hms(2023, 3, 17, h, 0, 0).unwrap();
/// let bounds = DateRange::new(at(0), at(12));
/// let gaps = excluded_ranges(bounds, &[DateRange::new(at(2), at(4))]);
/// assert_eq!(gaps, vec![DateRange::new(at(0), at(2)), DateRange::new(at(4), at(12))]);
/// ```
pub fn excluded_ranges(bounds: DateRange, included: &[DateRange]) -> Vec<DateRange> {
    let bounds = normalized_range(bounds);
    let mut gaps = Vec::new();
    let mut cursor = bounds.start;

    for range in collapsed_ranges(included) {
        if range.start >= bounds.end {
            break;
        }
        if range.end <= cursor {
            continue;
        }
        if range.start > cursor {
            gaps.push(DateRange::new(cursor, range.start));
        }
        cursor = range.end;
    }
    if cursor < bounds.end {
        gaps.push(DateRange::new(cursor, bounds.end));
    }
    gaps
}

// ── Intervals ───────────────────────────────────────────────────────────────

/// Sort intervals by start and merge those that overlap or abut.
pub fn merge_intervals(intervals: &[Interval]) -> Vec<Interval> {
    let mut sorted = intervals.to_vec();
    sorted.sort_by(|a, b| a.start().cmp(b.start()));

    let mut merged: Vec<Interval> = Vec::with_capacity(sorted.len());
    for next in sorted {
        match merged.last_mut() {
            Some(previous) if previous.touches(&next) => {
                if next.end() > previous.end() {
                    *previous = Interval::spanning(*previous.start(), *next.end());
                }
            }
            _ => merged.push(next),
        }
    }
    merged
}

/// Merge `intervals` and return the instants at which time switches between
/// covered and uncovered, in chronological order.
///
/// The result segments the span from the earliest start to the latest end
/// into alternating covered/uncovered blocks: `[start₀, end₀, start₁, end₁, …]`.
pub fn to_transitions(intervals: &[Interval]) -> Vec<DateTime<Tz>> {
    merge_intervals(intervals)
        .into_iter()
        .flat_map(|interval| [*interval.start(), *interval.end()])
        .collect()
}

/// Position of each point within `interval` as a fraction of its length.
///
/// A point at the start maps to `0`, at the end to `1`, half-way to `0.5`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidInput`] if a point is neither contained in
/// `interval` nor equal to its end, or if the interval is zero-length (no
/// position within it is defined).
pub fn to_fractions(interval: &Interval, points: &[DateTime<Tz>]) -> Result<Vec<f64>> {
    if let Some(outside) = points
        .iter()
        .find(|point| !interval.contains(point) && *point != interval.end())
    {
        return Err(EngineError::InvalidInput(format!(
            "{} is not contained within the bounding interval {}",
            format_instant(outside),
            interval
        )));
    }
    if points.is_empty() {
        return Ok(Vec::new());
    }
    if interval.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "cannot take fractions of the zero-length interval {}",
            interval
        )));
    }

    let length = interval.length_millis() as f64;
    let start = interval.start().timestamp_millis();
    Ok(points
        .iter()
        .map(|point| (point.timestamp_millis() - start) as f64 / length)
        .collect())
}

/// Relative lengths of the sub-intervals produced by splitting `interval` at
/// `splits`.
///
/// `interval.end` is always appended as the final split, so `n` splits yield
/// `n + 1` values; a split list that already ends at `interval.end` yields a
/// trailing `0`. Each value is the difference between consecutive cumulative
/// fractions, which keeps the sum at `1.0` without accumulating rounding
/// error from independent divisions.
///
/// # Errors
///
/// Same as [`to_fractions`].
pub fn to_length_fractions(interval: &Interval, splits: &[DateTime<Tz>]) -> Result<Vec<f64>> {
    let mut points = Vec::with_capacity(splits.len() + 1);
    points.extend_from_slice(splits);
    points.push(*interval.end());

    let fractions = to_fractions(interval, &points)?;
    let mut previous = 0.0;
    Ok(fractions
        .into_iter()
        .enumerate()
        .map(|(index, fraction)| {
            let length = if index == 0 {
                fraction
            } else {
                fraction - previous
            };
            previous = fraction;
            length
        })
        .collect())
}

// ── Tests ───────────────────────────────────────────────────────────────────
