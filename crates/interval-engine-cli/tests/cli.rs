use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn intervals() -> Command {
    let mut cmd = Command::cargo_bin("intervals").unwrap();
    cmd.env_remove("INTERVALS_ZONE").env_remove("RUST_LOG");
    cmd
}

fn json_output(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn test_julian_day() {
    let json = json_output(intervals().args(["julian-day", "2023-04-20T00:00:00Z"]));
    assert_eq!(json["julianDay"], 2_460_054);
    assert_eq!(json["instant"], "2023-04-20T00:00:00.000Z");
}

#[test]
fn test_cycle() {
    let json = json_output(intervals().args([
        "cycle",
        "--base",
        "2023-03-23T00:00:00Z",
        "--length",
        "28",
        "--at",
        "2023-05-17T23:59:59.999Z",
    ]));
    assert_eq!(json["start"], "2023-04-20T00:00:00.000Z");
    assert_eq!(json["end"], "2023-05-18T00:00:00.000Z");
}

#[test]
fn test_period_with_negative_offset() {
    let json = json_output(intervals().args([
        "period",
        "--base",
        "2023-01-01T00:00:00.000Z",
        "--unit",
        "quarter",
        "--at",
        "2023-05-10T00:00:00Z",
        "--offset",
        "-5",
    ]));
    assert_eq!(json["start"], "2022-01-01T00:00:00.000Z");
    assert_eq!(json["end"], "2022-04-01T00:00:00.000Z");
}

#[test]
fn test_all_of_day_in_zone() {
    let json = json_output(intervals().args([
        "--zone",
        "America/Chicago",
        "all-of",
        "1",
        "day",
        "--at",
        "2023-03-17T12:34:56.789Z",
    ]));
    assert_eq!(json["start"], "2023-03-17T00:00:00.000-05:00");
    assert_eq!(json["end"], "2023-03-18T00:00:00.000-05:00");
}

#[test]
fn test_remainder_of_weeks() {
    let json = json_output(intervals().args([
        "remainder-of",
        "2",
        "weeks",
        "--zone",
        "America/Chicago",
        "--at",
        "2023-03-11T12:34:56.789Z",
    ]));
    assert_eq!(json["start"], "2023-03-11T06:34:56.789-06:00");
    assert_eq!(json["end"], "2023-03-12T00:00:00.000-06:00");
}

#[test]
fn test_resolve_named_window_uses_zone_from_env() {
    let json = json_output(
        intervals()
            .env("INTERVALS_ZONE", "America/Chicago")
            .args(["resolve", "previous weekend", "--at", "2023-04-17T05:00:00Z"]),
    );
    assert_eq!(json["start"], "2023-04-15T00:00:00.000-05:00");
    assert_eq!(json["end"], "2023-04-17T00:00:00.000-05:00");
}

#[test]
fn test_resolve_literal_interval() {
    let json = json_output(intervals().args([
        "resolve",
        "2023-04-01T00:00:00Z/2023-04-02T00:00:00Z",
        "--at",
        "2024-01-01T00:00:00Z",
    ]));
    assert_eq!(json["start"], "2023-04-01T00:00:00.000Z");
    assert_eq!(json["end"], "2023-04-02T00:00:00.000Z");
}

#[test]
fn test_resolve_unknown_window_fails() {
    intervals()
        .args(["resolve", "next fortnight", "--at", "2023-04-17T05:00:00Z"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown date window"));
}

#[test]
fn test_solar() {
    let json = json_output(intervals().args([
        "--zone",
        "America/Chicago",
        "solar",
        "--lat",
        "43.2869331",
        "--lng",
        "-89.7240116",
        "--at",
        "2023-01-01",
    ]));
    assert_eq!(json["daylight"]["start"], "2023-01-01T07:32:26.270-06:00");
    assert_eq!(json["daylight"]["end"], "2023-01-01T16:34:35.400-06:00");
    assert_eq!(json["day"]["start"], "2023-01-01T00:00:00.000-06:00");
}

#[test]
fn test_solar_polar_day_fails() {
    intervals()
        .args([
            "--zone",
            "Arctic/Longyearbyen",
            "solar",
            "--lat",
            "78.2232",
            "--lng",
            "15.6267",
            "--at",
            "2023-06-21",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Computation domain error"));
}

#[test]
fn test_gaps() {
    let json = json_output(intervals().args([
        "gaps",
        "--bounds",
        "2023-03-17T00:00:00Z/2023-03-18T00:00:00Z",
        "2023-03-17T02:00:00Z/2023-03-17T04:00:00Z",
        "2023-03-17T05:00:00Z/2023-03-17T06:00:00Z",
    ]));
    let gaps = json.as_array().unwrap();
    assert_eq!(gaps.len(), 3);
    assert_eq!(gaps[0]["start"], "2023-03-17T00:00:00.000Z");
    assert_eq!(gaps[0]["end"], "2023-03-17T02:00:00.000Z");
    assert_eq!(gaps[1]["start"], "2023-03-17T04:00:00.000Z");
    assert_eq!(gaps[2]["end"], "2023-03-18T00:00:00.000Z");
}

#[test]
fn test_transitions() {
    let json = json_output(intervals().args([
        "transitions",
        "2023-04-21T00:00:00Z/2023-04-22T00:00:00Z",
        "2023-04-22T00:00:00Z/2023-04-23T00:00:00Z",
    ]));
    assert_eq!(
        json,
        serde_json::json!(["2023-04-21T00:00:00.000Z", "2023-04-23T00:00:00.000Z"])
    );
}

#[test]
fn test_length_fractions() {
    let json = json_output(intervals().args([
        "length-fractions",
        "--interval",
        "2023-04-16T00:00:00Z/2023-04-17T00:00:00Z",
        "2023-04-16T00:00:00Z",
        "2023-04-17T00:00:00Z",
    ]));
    assert_eq!(json, serde_json::json!([0.0, 1.0, 0.0]));
}

#[test]
fn test_fractions_point_outside_interval_fails() {
    intervals()
        .args([
            "fractions",
            "--interval",
            "2023-04-16T00:00:00Z/2023-04-17T00:00:00Z",
            "2023-04-18T00:00:00Z",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not contained"));
}

#[test]
fn test_unknown_zone_fails() {
    intervals()
        .args(["--zone", "Mars/Olympus_Mons", "julian-day", "2023-04-20T00:00:00Z"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid timezone"));
}
