use std::hint::black_box;

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use interval_engine::{
    period_interval, solar_intervals, to_length_fractions, CalendarResolver, CalendarUnit,
    GeoCoordinates, Interval, PeriodDuration, Periodicity, SolarCache,
};

fn utc(iso: &str) -> DateTime<Tz> {
    DateTime::parse_from_rfc3339(iso)
        .unwrap()
        .with_timezone(&Tz::UTC)
}

fn bench_period_interval(c: &mut Criterion) {
    let mut group = c.benchmark_group("period_interval");
    let reference = utc("2023-05-17T23:59:59.999Z");

    for (name, duration) in [
        ("28_days", PeriodDuration::days(28)),
        ("1_month", PeriodDuration::new(CalendarUnit::Month, 1)),
        ("1_quarter", PeriodDuration::new(CalendarUnit::Quarter, 1)),
    ] {
        let periodicity = Periodicity::new(utc("2003-03-23T00:00:00Z"), duration);
        group.bench_with_input(BenchmarkId::new("twenty_years", name), &periodicity, |b, p| {
            b.iter(|| period_interval(black_box(p), black_box(&reference), 0));
        });
    }

    group.finish();
}

fn bench_calendar_windows(c: &mut Criterion) {
    let mut group = c.benchmark_group("calendar");
    let resolver = CalendarResolver::new("America/Chicago").unwrap();
    let instant = resolver.to_date_time("2023-03-17T12:34:56.789Z").unwrap();

    group.bench_function("all_of_2_weeks", |b| {
        b.iter(|| resolver.all_of(2, CalendarUnit::Week, black_box(&instant)));
    });
    group.bench_function("resolve_next_weekend", |b| {
        b.iter(|| resolver.resolve_str(black_box("next weekend"), black_box(&instant)));
    });

    group.finish();
}

fn bench_solar(c: &mut Criterion) {
    let mut group = c.benchmark_group("solar");
    let tz: Tz = "America/Chicago".parse().unwrap();
    let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let coords = GeoCoordinates::new(43.2869331, -89.7240116).unwrap();

    group.bench_function("solar_intervals", |b| {
        b.iter(|| solar_intervals(black_box(&tz), black_box(date), black_box(&coords)));
    });

    let cache = SolarCache::new();
    group.bench_function("solar_intervals_cached", |b| {
        b.iter(|| cache.solar_intervals(black_box(&tz), black_box(date), black_box(&coords)));
    });

    group.finish();
}

fn bench_length_fractions(c: &mut Criterion) {
    let day = Interval::new(utc("2023-04-16T00:00:00Z"), utc("2023-04-17T00:00:00Z")).unwrap();
    let splits: Vec<DateTime<Tz>> = (0..=24)
        .map(|hour| *day.start() + chrono::Duration::hours(hour))
        .collect();

    c.bench_function("to_length_fractions_hourly", |b| {
        b.iter(|| to_length_fractions(black_box(&day), black_box(&splits)));
    });
}

criterion_group!(
    benches,
    bench_period_interval,
    bench_calendar_windows,
    bench_solar,
    bench_length_fractions
);
criterion_main!(benches);
