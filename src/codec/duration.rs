//! Durations: `TimeSpan` objects on read, zero-based `HH:MM:SS` on write

use crate::{Error, Result};
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer};

/// Unit of an integer duration count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Minutes,
    Seconds,
}

/// .NET `System.TimeSpan` as emitted by `ConvertTo-Json`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TimeSpan {
    pub ticks: f64,
    pub days: f64,
    pub hours: f64,
    pub minutes: f64,
    pub seconds: f64,
    pub milliseconds: f64,
    pub total_days: f64,
    pub total_hours: f64,
    pub total_minutes: f64,
    pub total_seconds: f64,
    pub total_milliseconds: f64,
}

impl TimeSpan {
    pub fn from_seconds(total: f64) -> Self {
        let whole = total.trunc();
        Self {
            ticks: total * 10_000_000.0,
            days: (whole / 86_400.0).trunc(),
            hours: ((whole % 86_400.0) / 3_600.0).trunc(),
            minutes: ((whole % 3_600.0) / 60.0).trunc(),
            seconds: whole % 60.0,
            milliseconds: ((total - whole) * 1_000.0).round(),
            total_days: total / 86_400.0,
            total_hours: total / 3_600.0,
            total_minutes: total / 60.0,
            total_seconds: total,
            total_milliseconds: total * 1_000.0,
        }
    }

    /// Parse the `[d.]HH:MM:SS[.fffffff]` form `TimeSpan.ToString()` produces
    pub fn parse_clock(value: &str) -> Result<Self> {
        let value = value.trim();
        let (days, clock) = match value.split_once('.') {
            Some((days, rest)) if !days.contains(':') => {
                let days: u64 = days
                    .parse()
                    .map_err(|_| Error::Parse(format!("invalid time span '{}'", value)))?;
                (days, rest)
            }
            _ => (0, value),
        };
        let clock = clock.split('.').next().unwrap_or(clock);
        let time = NaiveTime::parse_from_str(clock, "%H:%M:%S")
            .map_err(|e| Error::Parse(format!("invalid time span '{}': {}", value, e)))?;

        let total = days as f64 * 86_400.0 + f64::from(time.num_seconds_from_midnight());
        Ok(Self::from_seconds(total))
    }

    /// Whole units at the given granularity, truncated
    pub fn total(&self, granularity: Granularity) -> u32 {
        match granularity {
            Granularity::Minutes => self.total_minutes as u32,
            Granularity::Seconds => self.total_seconds as u32,
        }
    }
}

/// `TimeSpan` literal: 90 seconds is `00:01:30`, 1500 minutes is `1.01:00:00`.
/// Whole days go in front of the clock as `TimeSpan.Parse` expects.
pub fn encode(count: u32, granularity: Granularity) -> String {
    let seconds = match granularity {
        Granularity::Minutes => i64::from(count) * 60,
        Granularity::Seconds => i64::from(count),
    };
    let days = seconds / 86_400;
    let time = NaiveTime::MIN + chrono::Duration::seconds(seconds % 86_400);
    let clock = time.format("%H:%M:%S");
    if days == 0 {
        clock.to_string()
    } else {
        format!("{}.{}", days, clock)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireDuration {
    Span(TimeSpan),
    Clock(String),
}

fn decode<'de, D>(deserializer: D, granularity: Granularity) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let span = match WireDuration::deserialize(deserializer)? {
        WireDuration::Span(span) => span,
        WireDuration::Clock(clock) => {
            TimeSpan::parse_clock(&clock).map_err(serde::de::Error::custom)?
        }
    };
    Ok(span.total(granularity))
}

/// `deserialize_with` adapter for minute-granularity fields
pub fn minutes<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    decode(deserializer, Granularity::Minutes)
}

/// `deserialize_with` adapter for second-granularity fields
pub fn seconds<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    decode(deserializer, Granularity::Seconds)
}
