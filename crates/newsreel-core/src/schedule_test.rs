use chrono::{NaiveDate, TimeZone, Utc};

use super::*;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

#[test]
fn every_hour_on_the_half_hour_yields_48_events() {
    let schedule = Schedule::from_patterns("*", "0,30").unwrap();
    let events = schedule.events(day(2024, 1, 1));
    assert_eq!(events.len(), 48);
    assert_eq!(events[0], at(2024, 1, 1, 0, 0, 0));
    assert_eq!(events[1], at(2024, 1, 1, 0, 30, 0));
    assert_eq!(events[47], at(2024, 1, 1, 23, 30, 0));
}

#[test]
fn events_iterate_hours_outer_minutes_inner() {
    let schedule = Schedule::from_patterns("6,12", "0,30").unwrap();
    let events = schedule.events(day(2024, 1, 1));
    assert_eq!(
        events,
        vec![
            at(2024, 1, 1, 6, 0, 0),
            at(2024, 1, 1, 6, 30, 0),
            at(2024, 1, 1, 12, 0, 0),
            at(2024, 1, 1, 12, 30, 0),
        ]
    );
}

#[test]
fn events_are_ascending() {
    let schedule = Schedule::from_patterns("0,7,19,23", "5,15,45").unwrap();
    let events = schedule.events(day(2024, 6, 15));
    assert!(events.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn next_picks_first_event_after_t() {
    let schedule = Schedule::from_patterns("*", "0,30").unwrap();
    let next = schedule.next_after(at(2024, 1, 1, 12, 10, 0)).unwrap();
    assert_eq!(next, at(2024, 1, 1, 12, 30, 0));
}

#[test]
fn next_is_strictly_after_t() {
    let schedule = Schedule::from_patterns("6", "0").unwrap();
    let next = schedule.next_after(at(2024, 1, 1, 6, 0, 0)).unwrap();
    assert_eq!(next, at(2024, 1, 2, 6, 0, 0));
}

#[test]
fn next_rolls_over_to_tomorrow() {
    let schedule = Schedule::from_patterns("*", "0,30").unwrap();
    let next = schedule.next_after(at(2024, 1, 1, 23, 45, 0)).unwrap();
    assert_eq!(next, at(2024, 1, 2, 0, 0, 0));
}

#[test]
fn previous_includes_an_exact_match() {
    let schedule = Schedule::from_patterns("6", "0").unwrap();
    let previous = schedule.previous_at(at(2024, 1, 1, 6, 0, 0)).unwrap();
    assert_eq!(previous, at(2024, 1, 1, 6, 0, 0));
}

#[test]
fn previous_picks_latest_event_at_or_before_t() {
    let schedule = Schedule::from_patterns("6,12", "0,30").unwrap();
    let previous = schedule.previous_at(at(2024, 1, 1, 11, 59, 0)).unwrap();
    assert_eq!(previous, at(2024, 1, 1, 6, 30, 0));
}

#[test]
fn previous_rolls_back_to_yesterday() {
    let schedule = Schedule::from_patterns("6,12", "0,30").unwrap();
    let previous = schedule.previous_at(at(2024, 1, 2, 5, 0, 0)).unwrap();
    assert_eq!(previous, at(2024, 1, 1, 12, 30, 0));
}

#[test]
fn wildcard_hours_expand_to_every_hour() {
    let schedule = Schedule::from_patterns("*", "15").unwrap();
    let events = schedule.events(day(2024, 1, 1));
    assert_eq!(events.len(), 24);
    assert_eq!(events[0], at(2024, 1, 1, 0, 15, 0));
    assert_eq!(events[23], at(2024, 1, 1, 23, 15, 0));
}

#[test]
fn empty_pattern_is_rejected() {
    let result = Schedule::from_patterns("*", "  ");
    assert!(matches!(
        result,
        Err(ScheduleError::EmptyPattern { field: "minute" })
    ));
}

#[test]
fn unparseable_entry_is_rejected() {
    let result = Schedule::from_patterns("6,noon", "0");
    assert!(
        matches!(
            result,
            Err(ScheduleError::InvalidValue { field: "hour", ref raw }) if raw == "noon"
        ),
        "expected an invalid hour entry, got: {result:?}"
    );
}

#[test]
fn out_of_range_hour_is_rejected() {
    let result = Schedule::from_patterns("24", "0");
    assert!(matches!(
        result,
        Err(ScheduleError::OutOfRange {
            field: "hour",
            value: 24,
            max: 23
        })
    ));
}

#[test]
fn out_of_range_minute_is_rejected() {
    let result = Schedule::from_patterns("*", "60");
    assert!(matches!(
        result,
        Err(ScheduleError::OutOfRange {
            field: "minute",
            value: 60,
            max: 59
        })
    ));
}

#[test]
fn descending_pattern_is_rejected() {
    let result = Schedule::from_patterns("12,6", "0");
    assert!(matches!(
        result,
        Err(ScheduleError::Unordered { field: "hour" })
    ));
}

#[test]
fn duplicate_entries_are_rejected() {
    let result = Schedule::from_patterns("*", "0,0");
    assert!(matches!(
        result,
        Err(ScheduleError::Unordered { field: "minute" })
    ));
}

#[test]
fn entries_may_carry_whitespace() {
    let schedule = Schedule::from_patterns(" 6 , 12 ", " 0 , 30 ").unwrap();
    let events = schedule.events(day(2024, 1, 1));
    assert_eq!(events.len(), 4);
}
