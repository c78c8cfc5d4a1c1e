use std::{fs::File, io::Read, path::Path};

use ahash::AHashSet;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use tracing::debug;
use ustr::{ustr, Ustr};

use crate::{Error, Reading, Result, Season};

pub const REQUIRED_COLUMNS: [&str; 4] = ["timestamp", "city", "season", "temperature"];

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Deserialize)]
struct TemperatureCSVRecord {
    timestamp: String,
    city: String,
    season: String,
    temperature: f64,
}

/// Required columns absent from `columns`, in canonical order.
pub fn missing_columns<S: AsRef<str>>(columns: &[S]) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|required| !columns.iter().any(|c| c.as_ref() == **required))
        .map(|required| required.to_string())
        .collect()
}

pub fn validate_schema<S: AsRef<str>>(columns: &[S]) -> bool {
    missing_columns(columns).is_empty()
}

pub fn require_schema<S: AsRef<str>>(columns: &[S]) -> Result<()> {
    let missing = missing_columns(columns);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingColumns { missing })
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Historical readings in arrival (file) order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    readings: Vec<Reading>,
}

impl Dataset {
    pub fn new(readings: Vec<Reading>) -> Self {
        Self { readings }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "loading dataset");
        Self::from_reader(file)
    }

    /// Reads a headed CSV. The header is checked against the required columns
    /// before any row is parsed; unknown columns are ignored.
    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(source);
        let headers = reader.headers()?.clone();
        require_schema(&headers.iter().collect::<Vec<_>>())?;

        let mut readings = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row = record.position().map(|p| p.line()).unwrap_or_default();
            let raw: TemperatureCSVRecord = record.deserialize(Some(&headers))?;

            let season = raw
                .season
                .parse::<Season>()
                .map_err(|reason| Error::InvalidRecord { row, reason })?;
            let timestamp = parse_timestamp(&raw.timestamp).ok_or_else(|| Error::InvalidRecord {
                row,
                reason: format!("unparseable timestamp `{}`", raw.timestamp),
            })?;
            if !raw.temperature.is_finite() {
                return Err(Error::InvalidRecord {
                    row,
                    reason: format!("non-finite temperature {}", raw.temperature),
                });
            }

            readings.push(Reading {
                timestamp,
                city: ustr(&raw.city),
                season,
                temperature: raw.temperature,
            });
        }
        debug!(rows = readings.len(), "dataset loaded");
        Ok(Self { readings })
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Distinct cities in order of first appearance.
    pub fn cities(&self) -> Vec<Ustr> {
        let mut seen = AHashSet::new();
        self.readings
            .iter()
            .filter(|r| seen.insert(r.city))
            .map(|r| r.city)
            .collect()
    }
}
