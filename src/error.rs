use thiserror::Error;

use crate::Season;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The dataset lacks one or more of `timestamp`, `city`, `season`, `temperature`.
    #[error("missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    /// No historical baseline exists for the requested pair.
    #[error("no baseline for {city}/{season}")]
    NoBaseline { city: String, season: Season },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid record at row {row}: {reason}")]
    InvalidRecord { row: u64, reason: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
