//! Solar ephemeris: sunrise, sunset and twilight bands for a local day.
//!
//! Sun positions use the low-precision model from the Astronomical Almanac
//! (mean anomaly, equation of centre, ecliptic longitude, declination) which
//! is accurate to about a minute for latitudes below the polar circles.
//!
//! # Types
//!
//! - [`GeoCoordinates`] — observer position in decimal degrees
//! - [`SolarTimes`] — the raw crossing instants for one solar day
//! - [`SolarIntervals`] — the local day divided into night, twilight and daylight bands
//! - [`SolarCache`] — shared memo of computed [`SolarIntervals`]

use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{EngineError, Result};
use crate::interval::Interval;
use crate::zone::{offset_minutes, start_of_day};

const RAD: f64 = PI / 180.0;
const DAY_MS: f64 = 86_400_000.0;
const J1970: f64 = 2_440_588.0;
const J2000: f64 = 2_451_545.0;
const J0: f64 = 0.0009;
/// Obliquity of the ecliptic.
const OBLIQUITY: f64 = RAD * 23.4397;

/// Sun altitude, in degrees, at each crossing.
const SUNRISE: f64 = -0.833;
const SUNRISE_END: f64 = -0.3;
const CIVIL: f64 = -6.0;
const NAUTICAL: f64 = -12.0;
const ASTRONOMICAL: f64 = -18.0;

// ── Coordinates ─────────────────────────────────────────────────────────────

/// A position on the Earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CoordinatesRecord")]
pub struct GeoCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Unchecked wire form of [`GeoCoordinates`]; deserialization goes through
/// [`GeoCoordinates::new`].
#[derive(Deserialize)]
struct CoordinatesRecord {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<CoordinatesRecord> for GeoCoordinates {
    type Error = EngineError;

    fn try_from(record: CoordinatesRecord) -> Result<Self> {
        GeoCoordinates::new(record.latitude, record.longitude)
    }
}

impl GeoCoordinates {
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if latitude is outside
    /// `[-90, 90]` or longitude outside `[-180, 180]`.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(EngineError::InvalidInput(format!(
                "latitude {} is outside [-90, 90]",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(EngineError::InvalidInput(format!(
                "longitude {} is outside [-180, 180]",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

impl fmt::Display for GeoCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

// ── Solar times ─────────────────────────────────────────────────────────────

/// Crossing instants of the sun for the solar day nearest a query instant.
///
/// Morning crossings precede solar noon and evening crossings follow it;
/// `nadir` is the sun's lowest point twelve hours before noon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolarTimes {
    pub solar_noon: DateTime<Utc>,
    pub nadir: DateTime<Utc>,
    pub night_end: DateTime<Utc>,
    pub nautical_dawn: DateTime<Utc>,
    pub dawn: DateTime<Utc>,
    pub sunrise: DateTime<Utc>,
    pub sunrise_end: DateTime<Utc>,
    pub sunset_start: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub dusk: DateTime<Utc>,
    pub nautical_dusk: DateTime<Utc>,
    pub night: DateTime<Utc>,
}

/// Compute the sun's crossing instants for the solar day nearest `at`.
///
/// # Errors
///
/// Returns [`EngineError::ComputationDomain`] when the sun never reaches one
/// of the crossing altitudes that day (polar day or night), or when an
/// instant falls outside the representable range.
pub fn solar_times(at: DateTime<Utc>, coords: &GeoCoordinates) -> Result<SolarTimes> {
    let lw = RAD * -coords.longitude;
    let phi = RAD * coords.latitude;

    let days = at.timestamp_millis() as f64 / DAY_MS - 0.5 + J1970 - J2000;
    let cycle = (days - J0 - lw / (2.0 * PI) + 0.5).floor();
    let transit = J0 + lw / (2.0 * PI) + cycle;

    let anomaly = RAD * (357.5291 + 0.985_600_28 * transit);
    let centre = RAD
        * (1.9148 * anomaly.sin() + 0.02 * (2.0 * anomaly).sin() + 0.0003 * (3.0 * anomaly).sin());
    let longitude = anomaly + centre + RAD * 102.9372 + PI;
    let declination = (OBLIQUITY.sin() * longitude.sin()).asin();

    let transit_julian = |approx: f64| {
        J2000 + approx + 0.0053 * anomaly.sin() - 0.0069 * (2.0 * longitude).sin()
    };
    let noon = transit_julian(transit);

    // Julian dates at which the sun rises to and sets below `altitude`.
    let crossing = |altitude: f64| -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let cos_hour_angle = ((altitude * RAD).sin() - phi.sin() * declination.sin())
            / (phi.cos() * declination.cos());
        if !(-1.0..=1.0).contains(&cos_hour_angle) {
            return Err(EngineError::ComputationDomain(format!(
                "the sun does not cross {}° at {} on the solar day of {}",
                altitude,
                coords,
                at.date_naive()
            )));
        }
        let hour_angle = cos_hour_angle.acos();
        let set = transit_julian(J0 + (hour_angle + lw) / (2.0 * PI) + cycle);
        let rise = noon - (set - noon);
        Ok((from_julian(rise)?, from_julian(set)?))
    };

    let (sunrise, sunset) = crossing(SUNRISE)?;
    let (sunrise_end, sunset_start) = crossing(SUNRISE_END)?;
    let (dawn, dusk) = crossing(CIVIL)?;
    let (nautical_dawn, nautical_dusk) = crossing(NAUTICAL)?;
    let (night_end, night) = crossing(ASTRONOMICAL)?;

    Ok(SolarTimes {
        solar_noon: from_julian(noon)?,
        nadir: from_julian(noon - 0.5)?,
        night_end,
        nautical_dawn,
        dawn,
        sunrise,
        sunrise_end,
        sunset_start,
        sunset,
        dusk,
        nautical_dusk,
        night,
    })
}

/// Julian date to an instant, truncated to whole milliseconds.
fn from_julian(julian: f64) -> Result<DateTime<Utc>> {
    let millis = (julian + 0.5 - J1970) * DAY_MS;
    if !millis.is_finite() {
        return Err(EngineError::ComputationDomain(format!(
            "Julian date {} has no instant",
            julian
        )));
    }
    DateTime::from_timestamp_millis(millis as i64).ok_or_else(|| {
        EngineError::ComputationDomain(format!("Julian date {} is out of range", julian))
    })
}

// ── Solar intervals ─────────────────────────────────────────────────────────

/// Portion of the solar day an instant falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SolarPhase {
    Night,
    MorningAstronomicalTwilight,
    MorningNauticalTwilight,
    MorningCivilTwilight,
    Daylight,
    EveningCivilTwilight,
    EveningNauticalTwilight,
    EveningAstronomicalTwilight,
}

impl SolarPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Night => "night",
            Self::MorningAstronomicalTwilight => "morningAstronomicalTwilight",
            Self::MorningNauticalTwilight => "morningNauticalTwilight",
            Self::MorningCivilTwilight => "morningCivilTwilight",
            Self::Daylight => "daylight",
            Self::EveningCivilTwilight => "eveningCivilTwilight",
            Self::EveningNauticalTwilight => "eveningNauticalTwilight",
            Self::EveningAstronomicalTwilight => "eveningAstronomicalTwilight",
        }
    }
}

impl fmt::Display for SolarPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A local calendar day divided into solar bands.
///
/// The seven bands are contiguous, in field order, from the end of
/// astronomical night to its return. `day` is the local calendar day and may
/// be shorter or longer than 24 hours on a DST transition day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolarIntervals {
    pub day: Interval,
    pub morning_astronomical_twilight: Interval,
    pub morning_nautical_twilight: Interval,
    pub morning_civil_twilight: Interval,
    pub daylight: Interval,
    pub evening_civil_twilight: Interval,
    pub evening_nautical_twilight: Interval,
    pub evening_astronomical_twilight: Interval,
}

impl SolarIntervals {
    /// The seven sub-day bands in chronological order.
    pub fn bands(&self) -> [(SolarPhase, &Interval); 7] {
        [
            (
                SolarPhase::MorningAstronomicalTwilight,
                &self.morning_astronomical_twilight,
            ),
            (
                SolarPhase::MorningNauticalTwilight,
                &self.morning_nautical_twilight,
            ),
            (SolarPhase::MorningCivilTwilight, &self.morning_civil_twilight),
            (SolarPhase::Daylight, &self.daylight),
            (SolarPhase::EveningCivilTwilight, &self.evening_civil_twilight),
            (
                SolarPhase::EveningNauticalTwilight,
                &self.evening_nautical_twilight,
            ),
            (
                SolarPhase::EveningAstronomicalTwilight,
                &self.evening_astronomical_twilight,
            ),
        ]
    }

    /// Instants at which the phase changes, each paired with the phase that
    /// begins there. The last entry is the return of night.
    pub fn transitions(&self) -> Vec<(DateTime<Tz>, SolarPhase)> {
        let mut transitions: Vec<(DateTime<Tz>, SolarPhase)> = self
            .bands()
            .iter()
            .map(|(phase, band)| (*band.start(), *phase))
            .collect();
        transitions.push((*self.evening_astronomical_twilight.end(), SolarPhase::Night));
        transitions
    }

    /// The phase in effect at `instant`; anything outside the bands is night.
    pub fn phase_at(&self, instant: &DateTime<Tz>) -> SolarPhase {
        self.bands()
            .iter()
            .find(|(_, band)| band.contains(instant))
            .map(|(phase, _)| *phase)
            .unwrap_or(SolarPhase::Night)
    }
}

/// Compute the solar bands of the local calendar day `date` in `tz`.
///
/// The query instant handed to [`solar_times`] is local midnight shifted by
/// `(0.5 - longitude + offset_minutes / 4) / 15` hours, which keeps the
/// zone-unaware solar day selection on the intended calendar day.
///
/// # Errors
///
/// Returns [`EngineError::ComputationDomain`] under the conditions of
/// [`solar_times`].
pub fn solar_intervals(tz: &Tz, date: NaiveDate, coords: &GeoCoordinates) -> Result<SolarIntervals> {
    let next = date.succ_opt().ok_or_else(|| {
        EngineError::ComputationDomain(format!("no calendar day follows {}", date))
    })?;
    let start = start_of_day(tz, date);
    let end = start_of_day(tz, next);

    let adjustment_hours =
        (0.5 - coords.longitude + f64::from(offset_minutes(&start)) / 4.0) / 15.0;
    let query = start.with_timezone(&Utc)
        + Duration::milliseconds((adjustment_hours * 3_600_000.0) as i64);
    let times = solar_times(query, coords)?;

    let band = |from: DateTime<Utc>, to: DateTime<Utc>| -> Result<Interval> {
        if to < from {
            return Err(EngineError::ComputationDomain(format!(
                "solar crossings out of order at {} on {}",
                coords, date
            )));
        }
        Ok(Interval::spanning(from.with_timezone(tz), to.with_timezone(tz)))
    };

    Ok(SolarIntervals {
        day: Interval::spanning(start, end),
        morning_astronomical_twilight: band(times.night_end, times.nautical_dawn)?,
        morning_nautical_twilight: band(times.nautical_dawn, times.dawn)?,
        morning_civil_twilight: band(times.dawn, times.sunrise)?,
        daylight: band(times.sunrise, times.sunset)?,
        evening_civil_twilight: band(times.sunset, times.dusk)?,
        evening_nautical_twilight: band(times.dusk, times.nautical_dusk)?,
        evening_astronomical_twilight: band(times.nautical_dusk, times.night)?,
    })
}

// ── Cache ───────────────────────────────────────────────────────────────────

/// Zone name, local date and coordinates in micro-degrees.
type CacheKey = (&'static str, NaiveDate, i64, i64);

/// Read-through memo of [`solar_intervals`], shareable across threads.
///
/// Entries are never invalidated: a day's solar bands do not change. The
/// lock is held only for lookup and insertion.
#[derive(Clone, Default)]
pub struct SolarCache {
    entries: Arc<RwLock<HashMap<CacheKey, SolarIntervals>>>,
}

impl SolarCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached [`solar_intervals`]; errors are returned but not cached.
    pub fn solar_intervals(
        &self,
        tz: &Tz,
        date: NaiveDate,
        coords: &GeoCoordinates,
    ) -> Result<SolarIntervals> {
        let key = (
            tz.name(),
            date,
            micro_degrees(coords.latitude),
            micro_degrees(coords.longitude),
        );
        let cached = self.entries.read().get(&key).cloned();
        if let Some(intervals) = cached {
            trace!("Solar cache hit for {} {} {}", key.0, date, coords);
            return Ok(intervals);
        }

        debug!("Solar cache miss for {} {} {}", key.0, date, coords);
        let intervals = solar_intervals(tz, date, coords)?;
        self.entries.write().insert(key, intervals.clone());
        Ok(intervals)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl fmt::Debug for SolarCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolarCache")
            .field("entries", &self.len())
            .finish()
    }
}

fn micro_degrees(degrees: f64) -> i64 {
    (degrees * 1_000_000.0).round() as i64
}

// ── Tests ───────────────────────────────────────────────────────────────────
