use std::{fmt::Display, str::FromStr};

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use ustr::Ustr;

pub mod baseline;
pub mod config;
pub mod dataset;
pub mod error;
pub mod group;
pub mod parallel;
pub mod smoothing;
pub mod strategy;

pub use baseline::{is_anomaly, AnnotatedReading, Baseline, BaselineTable};
pub use config::Config;
pub use dataset::{validate_schema, Dataset};
pub use error::{Error, Result};
pub use group::{group_readings, Group, GroupKey};
pub use parallel::Parallel;
pub use smoothing::{smooth, SmoothedReading};
pub use strategy::{analyze, annotate, Annotation, Executor, Sequential};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Fall];

    /// Meteorological season for a calendar month (1-12).
    pub fn from_month(month: u32) -> Option<Self> {
        match month {
            12 | 1 | 2 => Some(Season::Winter),
            3..=5 => Some(Season::Spring),
            6..=8 => Some(Season::Summer),
            9..=11 => Some(Season::Fall),
            _ => None,
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        // chrono months are always 1-12
        Self::from_month(date.month()).unwrap_or(Season::Winter)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
        }
    }
}

impl FromStr for Season {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "winter" => Ok(Season::Winter),
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "fall" | "autumn" => Ok(Season::Fall),
            other => Err(format!("unknown season label `{other}`")),
        }
    }
}

impl Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One historical observation, as loaded. Never mutated after ingestion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    pub city: Ustr,
    pub season: Season,
    pub temperature: f64,
}

impl Reading {
    pub fn new(timestamp: NaiveDateTime, city: &str, season: Season, temperature: f64) -> Self {
        Self {
            timestamp,
            city: ustr::ustr(city),
            season,
            temperature,
        }
    }

    pub fn key(&self) -> GroupKey {
        GroupKey {
            city: self.city,
            season: self.season,
        }
    }
}

impl Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}/{}: {:.1}",
            self.timestamp, self.city, self.season, self.temperature
        )
    }
}
