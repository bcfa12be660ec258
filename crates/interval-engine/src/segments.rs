//! Division of a period into covered segments and uncovered gaps.
//!
//! Used to lay a timeline out proportionally: every piece carries the
//! percentage of the period it occupies, and the percentages of a division
//! always total exactly `100`.

use serde::Serialize;

use crate::error::Result;
use crate::interval::Interval;
use crate::math::{percent, scale};

/// Anything occupying an interval of time.
pub trait Segment {
    fn interval(&self) -> &Interval;
}

impl Segment for Interval {
    fn interval(&self) -> &Interval {
        self
    }
}

/// One piece of a divided period.
///
/// `segment` is `None` for a gap not covered by any segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSegment<'a, S> {
    pub interval: Interval,
    pub percent: f64,
    pub segment: Option<&'a S>,
}

impl<S> PeriodSegment<'_, S> {
    pub fn is_gap(&self) -> bool {
        self.segment.is_none()
    }
}

/// Divide a period into pieces covering `segments` and the gaps between them.
///
/// When `period` is `None` it spans the earliest segment start to the latest
/// segment end, and an empty `segments` slice yields no pieces.
///
/// Segments are taken in order of start. Where two overlap, the earlier one
/// is kept whole and the later one is truncated at its start; a segment lying
/// entirely under earlier ones is dropped. Pieces are clipped to the period
/// and zero-length pieces are removed. The last piece's percentage absorbs
/// the rounding remainder so the total is `100`.
pub fn period_segments<'a, S: Segment>(
    period: Option<&Interval>,
    segments: &'a [S],
) -> Result<Vec<PeriodSegment<'a, S>>> {
    let period = match period {
        Some(period) => period.clone(),
        None => match covering(segments) {
            Some(period) => period,
            None => return Ok(Vec::new()),
        },
    };
    if segments.is_empty() {
        return Ok(vec![PeriodSegment {
            interval: period,
            percent: 100.0,
            segment: None,
        }]);
    }

    let mut ordered: Vec<&S> = segments
        .iter()
        .filter(|segment| segment.interval().overlaps(&period))
        .collect();
    ordered.sort_by(|a, b| a.interval().start().cmp(b.interval().start()));

    let mut pieces: Vec<(Interval, Option<&'a S>)> = Vec::new();
    let mut cursor = *period.start();
    for segment in ordered {
        let interval = segment.interval();
        if *interval.end() <= cursor {
            continue;
        }
        if *interval.start() > cursor {
            pieces.push((Interval::spanning(cursor, *interval.start()), None));
        }
        let start = cursor.max(*interval.start());
        let end = (*interval.end()).min(*period.end());
        pieces.push((Interval::spanning(start, end), Some(segment)));
        cursor = end;
    }
    if cursor < *period.end() {
        pieces.push((Interval::spanning(cursor, *period.end()), None));
    }
    pieces.retain(|(interval, _)| !interval.is_empty());

    let period_length = period.length_millis() as f64;
    let last = pieces.len().saturating_sub(1);
    let mut divided = Vec::with_capacity(pieces.len());
    let mut allotted = 0.0;
    for (index, (interval, segment)) in pieces.into_iter().enumerate() {
        let share = if index < last {
            percent(interval.length_millis() as f64 / period_length, 2)?
        } else {
            scale(100.0 - allotted, 2)?
        };
        allotted += share;
        divided.push(PeriodSegment {
            interval,
            percent: share,
            segment,
        });
    }
    Ok(divided)
}

fn covering<S: Segment>(segments: &[S]) -> Option<Interval> {
    let start = segments.iter().map(|s| *s.interval().start()).min()?;
    let end = segments.iter().map(|s| *s.interval().end()).max()?;
    Some(Interval::spanning(start, end))
}
