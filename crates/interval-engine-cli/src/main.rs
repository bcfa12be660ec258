//! `intervals`: command-line front end for interval-engine.
//!
//! Every subcommand prints pretty JSON on stdout. Errors go to stderr with a
//! non-zero exit status.
//!
//! Environment:
//! - `INTERVALS_ZONE`: default IANA zone for `--zone` (default: UTC)
//! - `RUST_LOG`: log filter when no `-v` flag is given (default: warn)

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use interval_engine::{
    cycle_interval, excluded_ranges, format_instant, julian_day, period_interval, to_fractions,
    to_length_fractions, to_transitions, CalendarResolver, CalendarUnit, DateRange, DateWindow,
    GeoCoordinates, Interval, NamedWindow, PeriodDuration, Periodicity,
};

#[derive(Parser)]
#[command(name = "intervals", version, about = "Zone-aware interval and cycle calculator")]
struct Cli {
    /// IANA zone for local calendar arithmetic and output offsets
    #[arg(long, short, global = true, env = "INTERVALS_ZONE", default_value = "UTC")]
    zone: String,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Julian Day Number of the UTC day containing an instant
    JulianDay {
        /// ISO 8601 instant
        instant: String,
    },
    /// Fixed-length cycle in days containing a reference instant
    Cycle {
        /// Start of any one cycle
        #[arg(long)]
        base: String,
        /// Cycle length in days
        #[arg(long)]
        length: i64,
        /// Reference instant (default: now)
        #[arg(long)]
        at: Option<String>,
        /// Cycles before (negative) or after (positive) the current one
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i64,
    },
    /// Calendar-unit cycle containing a reference instant
    Period {
        /// Start of any one cycle
        #[arg(long)]
        base: String,
        /// day, week, month, quarter or year
        #[arg(long)]
        unit: CalendarUnit,
        /// Units per cycle
        #[arg(long, default_value_t = 1)]
        count: u32,
        /// Reference instant (default: now)
        #[arg(long)]
        at: Option<String>,
        /// Cycles before (negative) or after (positive) the current one
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i64,
    },
    /// Calendar-aligned window of COUNT UNITs containing an instant
    AllOf {
        count: u32,
        unit: CalendarUnit,
        /// Instant inside the window (default: now)
        #[arg(long)]
        at: Option<String>,
    },
    /// From an instant to the end of its calendar-aligned window
    RemainderOf {
        count: u32,
        unit: CalendarUnit,
        /// Start instant (default: now)
        #[arg(long)]
        at: Option<String>,
    },
    /// Resolve a named window ("next weekend") or a literal START/END interval
    Resolve {
        window: String,
        /// Reference instant (default: now)
        #[arg(long)]
        at: Option<String>,
    },
    /// Night, twilight and daylight bands of a local day
    Solar {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude in decimal degrees (negative west)
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Any instant or date on the local day (default: today)
        #[arg(long)]
        at: Option<String>,
    },
    /// Gaps inside START/END bounds not covered by any of the given ranges
    Gaps {
        /// Bounding range as START/END
        #[arg(long)]
        bounds: String,
        /// Covered ranges as START/END
        ranges: Vec<String>,
    },
    /// Boundaries between covered and uncovered time
    Transitions {
        /// Intervals as START/END
        intervals: Vec<String>,
    },
    /// Positions of instants within an interval, from 0 to 1
    Fractions {
        /// Bounding interval as START/END
        #[arg(long)]
        interval: String,
        /// ISO 8601 instants
        points: Vec<String>,
    },
    /// Relative lengths of an interval split at the given instants
    LengthFractions {
        /// Bounding interval as START/END
        #[arg(long)]
        interval: String,
        /// ISO 8601 split instants
        splits: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let resolver = CalendarResolver::new(&cli.zone)
        .with_context(|| format!("--zone {}", cli.zone))?;
    debug!("Using zone {}", resolver.timezone());

    match cli.command {
        Commands::JulianDay { instant } => {
            let instant = instant_arg(&resolver, &instant)?;
            print_json(&json!({
                "instant": format_instant(&instant),
                "julianDay": julian_day(&instant),
            }))
        }
        Commands::Cycle {
            base,
            length,
            at,
            offset,
        } => {
            let base = instant_arg(&resolver, &base).context("--base")?;
            let at = reference(&resolver, at.as_deref())?;
            print_json(&cycle_interval(&base, length, &at, offset)?)
        }
        Commands::Period {
            base,
            unit,
            count,
            at,
            offset,
        } => {
            let base = instant_arg(&resolver, &base).context("--base")?;
            let periodicity = Periodicity::new(base, PeriodDuration::new(unit, count));
            let at = reference(&resolver, at.as_deref())?;
            print_json(&period_interval(&periodicity, &at, offset)?)
        }
        Commands::AllOf { count, unit, at } => {
            let at = reference(&resolver, at.as_deref())?;
            print_json(&resolver.all_of(count, unit, &at)?)
        }
        Commands::RemainderOf { count, unit, at } => {
            let at = reference(&resolver, at.as_deref())?;
            print_json(&resolver.remainder_of(count, unit, &at)?)
        }
        Commands::Resolve { window, at } => {
            let at = reference(&resolver, at.as_deref())?;
            let window = if window.contains('/') {
                DateWindow::Literal(interval_arg(&resolver, &window)?)
            } else {
                DateWindow::Named(window.parse::<NamedWindow>()?)
            };
            print_json(&resolver.resolve(&window, &at)?)
        }
        Commands::Solar { lat, lng, at } => {
            let coords = GeoCoordinates::new(lat, lng)?;
            let at = reference(&resolver, at.as_deref())?;
            print_json(&resolver.solar_intervals(&at, &coords)?)
        }
        Commands::Gaps { bounds, ranges } => {
            let bounds = range_arg(&resolver, &bounds).context("--bounds")?;
            let ranges = ranges
                .iter()
                .map(|range| range_arg(&resolver, range))
                .collect::<Result<Vec<_>>>()?;
            let gaps: Vec<Interval> = excluded_ranges(bounds, &ranges)
                .into_iter()
                .map(|gap| Interval::from(gap).with_timezone(&resolver.timezone()))
                .collect();
            print_json(&gaps)
        }
        Commands::Transitions { intervals } => {
            let intervals = intervals
                .iter()
                .map(|interval| interval_arg(&resolver, interval))
                .collect::<Result<Vec<_>>>()?;
            let transitions: Vec<String> =
                to_transitions(&intervals).iter().map(format_instant).collect();
            print_json(&transitions)
        }
        Commands::Fractions { interval, points } => {
            let interval = interval_arg(&resolver, &interval).context("--interval")?;
            let points = instants_arg(&resolver, &points)?;
            print_json(&to_fractions(&interval, &points)?)
        }
        Commands::LengthFractions { interval, splits } => {
            let interval = interval_arg(&resolver, &interval).context("--interval")?;
            let splits = instants_arg(&resolver, &splits)?;
            print_json(&to_length_fractions(&interval, &splits)?)
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// The `--at` instant, or now.
fn reference(resolver: &CalendarResolver, at: Option<&str>) -> Result<DateTime<Tz>> {
    match at {
        Some(at) => instant_arg(resolver, at).context("--at"),
        None => Ok(resolver.in_zone(&Utc::now())),
    }
}

fn instant_arg(resolver: &CalendarResolver, value: &str) -> Result<DateTime<Tz>> {
    Ok(resolver.to_date_time(value)?)
}

fn instants_arg(resolver: &CalendarResolver, values: &[String]) -> Result<Vec<DateTime<Tz>>> {
    values
        .iter()
        .map(|value| instant_arg(resolver, value))
        .collect()
}

/// Parse `START/END` into its two instants, in the order given.
fn endpoints_arg(resolver: &CalendarResolver, value: &str) -> Result<(DateTime<Tz>, DateTime<Tz>)> {
    let (start, end) = value
        .split_once('/')
        .with_context(|| format!("'{}': expected an interval as START/END", value))?;
    Ok((instant_arg(resolver, start)?, instant_arg(resolver, end)?))
}

fn interval_arg(resolver: &CalendarResolver, value: &str) -> Result<Interval> {
    let (start, end) = endpoints_arg(resolver, value)?;
    Interval::new(start, end).with_context(|| format!("'{}'", value))
}

/// Like [`interval_arg`] but a reversed range is accepted.
fn range_arg(resolver: &CalendarResolver, value: &str) -> Result<DateRange> {
    let (start, end) = endpoints_arg(resolver, value)?;
    Ok(DateRange::new(start.with_timezone(&Utc), end.with_timezone(&Utc)))
}
