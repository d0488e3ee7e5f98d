//! Recurrence schedule for edition publication times.
//!
//! A schedule is the cross product of an hour pattern and a minute pattern,
//! all in UTC: hours outer, minutes inner. `"6,12" x "0,30"` publishes at
//! 06:00, 06:30, 12:00 and 12:30 every day. Patterns are validated up front
//! so every later query works with known-good, ascending values.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("{field} pattern is empty")]
    EmptyPattern { field: &'static str },
    #[error("{field} pattern has an unparseable entry: \"{raw}\"")]
    InvalidValue { field: &'static str, raw: String },
    #[error("{field} value {value} is out of range (max {max})")]
    OutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },
    #[error("{field} pattern must be strictly ascending")]
    Unordered { field: &'static str },
    #[error("schedule yields no events")]
    NoEvents,
}

/// Daily publication schedule, minute-granular, in UTC.
#[derive(Debug, Clone)]
pub struct Schedule {
    hours: Vec<u32>,
    minutes: Vec<u32>,
}

impl Schedule {
    /// Parse and validate an hour pattern and a minute pattern.
    ///
    /// The hour pattern is either `*` (every hour) or a comma-separated list
    /// of hours 0..=23; the minute pattern is a comma-separated list of
    /// minutes 0..=59. Both lists must be strictly ascending.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError` when a pattern is empty, has an unparseable or
    /// out-of-range entry, or is not strictly ascending.
    pub fn from_patterns(hour_pattern: &str, minute_pattern: &str) -> Result<Self, ScheduleError> {
        let hours = if hour_pattern.trim() == "*" {
            (0..24).collect()
        } else {
            parse_field("hour", hour_pattern, 23)?
        };
        let minutes = parse_field("minute", minute_pattern, 59)?;
        Ok(Self { hours, minutes })
    }

    /// All publication instants on `day`, in ascending order.
    #[must_use]
    pub fn events(&self, day: NaiveDate) -> Vec<DateTime<Utc>> {
        let midnight = day.and_time(NaiveTime::MIN).and_utc();
        let mut events = Vec::with_capacity(self.hours.len() * self.minutes.len());
        for &hour in &self.hours {
            let top = midnight + Duration::hours(i64::from(hour));
            for &minute in &self.minutes {
                events.push(top + Duration::minutes(i64::from(minute)));
            }
        }
        events
    }

    /// The first publication instant strictly after `t`.
    ///
    /// Looks at `t`'s own day first, then rolls over to the next day's first
    /// event.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError::NoEvents` when no event exists after `t`.
    pub fn next_after(&self, t: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
        let today = t.date_naive();
        if let Some(event) = self.events(today).into_iter().find(|event| *event > t) {
            return Ok(event);
        }
        let tomorrow = today.succ_opt().ok_or(ScheduleError::NoEvents)?;
        self.events(tomorrow)
            .into_iter()
            .next()
            .ok_or(ScheduleError::NoEvents)
    }

    /// The most recent publication instant at or before `t`.
    ///
    /// The startup reconcile targets this instant: it is the edition the
    /// process may have missed while it was not running.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError::NoEvents` when no event exists at or before `t`.
    pub fn previous_at(&self, t: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
        let today = t.date_naive();
        if let Some(event) = self
            .events(today)
            .into_iter()
            .rev()
            .find(|event| *event <= t)
        {
            return Ok(event);
        }
        let yesterday = today.pred_opt().ok_or(ScheduleError::NoEvents)?;
        self.events(yesterday)
            .into_iter()
            .next_back()
            .ok_or(ScheduleError::NoEvents)
    }
}

fn parse_field(field: &'static str, pattern: &str, max: u32) -> Result<Vec<u32>, ScheduleError> {
    if pattern.trim().is_empty() {
        return Err(ScheduleError::EmptyPattern { field });
    }
    let mut values = Vec::new();
    for raw in pattern.split(',') {
        let raw = raw.trim();
        let value: u32 = raw.parse().map_err(|_| ScheduleError::InvalidValue {
            field,
            raw: raw.to_string(),
        })?;
        if value > max {
            return Err(ScheduleError::OutOfRange { field, value, max });
        }
        if values.last().is_some_and(|&prev| value <= prev) {
            return Err(ScheduleError::Unordered { field });
        }
        values.push(value);
    }
    Ok(values)
}

#[cfg(test)]
#[path = "schedule_test.rs"]
mod tests;
