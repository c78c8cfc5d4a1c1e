use std::fmt::Display;

use ahash::AHashMap;
use tracing::warn;
use ustr::Ustr;

use crate::{Error, Group, GroupKey, Result, Season, SmoothedReading};

/// Mean, sample standard deviation and acceptance band of one group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub mean: f64,
    pub std: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub count: usize,
}

impl Baseline {
    /// Computes the baseline of `values` with a band of `mean ± sigma * std`.
    ///
    /// `std` uses the n-1 divisor. A single value has no sample deviation; it
    /// gets `std = 0`, collapsing both bounds onto the mean. Returns `None`
    /// for an empty slice.
    pub fn from_temperatures(values: &[f64], sigma: f64) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let std = if count < 2 {
            0.0
        } else {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        };
        Some(Self::with_band(mean, std, count, sigma))
    }

    pub fn estimate(group: &Group, sigma: f64) -> Self {
        let values: Vec<f64> = group.temperatures().collect();
        if values.len() < 2 {
            warn!(group = %group.key(), "singleton group, std taken as 0");
        }
        // groups are built non-empty by the grouper
        Self::from_temperatures(&values, sigma)
            .unwrap_or_else(|| Self::with_band(f64::NAN, 0.0, 0, sigma))
    }

    fn with_band(mean: f64, std: f64, count: usize, sigma: f64) -> Self {
        Self {
            mean,
            std,
            lower_bound: mean - sigma * std,
            upper_bound: mean + sigma * std,
            count,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.count < 2
    }

    /// Strictly outside the band; a value on a bound is not an anomaly.
    pub fn is_anomaly(&self, temperature: f64) -> bool {
        temperature < self.lower_bound || temperature > self.upper_bound
    }
}

impl Display for Baseline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.2}±{:.2} [{:.2}, {:.2}] n={}",
            self.mean, self.std, self.lower_bound, self.upper_bound, self.count
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotatedReading {
    pub reading: SmoothedReading,
    pub is_anomaly: bool,
    pub average: f64,
    pub std: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl AnnotatedReading {
    pub fn key(&self) -> GroupKey {
        self.reading.key()
    }
}

/// Marks every member of `group` against `baseline`, keeping member order.
pub fn apply_baseline(group: &Group, baseline: &Baseline) -> Vec<AnnotatedReading> {
    group
        .members()
        .iter()
        .map(|reading| AnnotatedReading {
            reading: *reading,
            is_anomaly: baseline.is_anomaly(reading.temperature),
            average: baseline.mean,
            std: baseline.std,
            lower_bound: baseline.lower_bound,
            upper_bound: baseline.upper_bound,
        })
        .collect()
}

/// Result of the per-group unit of work run by every execution strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupAnnotation {
    pub key: GroupKey,
    pub baseline: Baseline,
    pub readings: Vec<AnnotatedReading>,
}

pub fn annotate_group(group: &Group, sigma: f64) -> GroupAnnotation {
    let baseline = Baseline::estimate(group, sigma);
    GroupAnnotation {
        key: group.key(),
        baseline,
        readings: apply_baseline(group, &baseline),
    }
}

/// Historical baselines keyed by (city, season).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaselineTable {
    baselines: AHashMap<GroupKey, Baseline>,
}

impl BaselineTable {
    pub fn from_groups(groups: &[Group], sigma: f64) -> Self {
        groups
            .iter()
            .map(|g| (g.key(), Baseline::estimate(g, sigma)))
            .collect()
    }

    /// Rebuilds the table from annotated rows of a previous run. The first
    /// row of each key supplies the statistics.
    pub fn from_annotated(rows: &[AnnotatedReading]) -> Self {
        let mut baselines: AHashMap<GroupKey, Baseline> = AHashMap::new();
        for row in rows {
            baselines
                .entry(row.key())
                .and_modify(|b| b.count += 1)
                .or_insert(Baseline {
                    mean: row.average,
                    std: row.std,
                    lower_bound: row.lower_bound,
                    upper_bound: row.upper_bound,
                    count: 1,
                });
        }
        Self { baselines }
    }

    pub fn insert(&mut self, key: GroupKey, baseline: Baseline) -> Option<Baseline> {
        self.baselines.insert(key, baseline)
    }

    pub fn get(&self, city: &str, season: Season) -> Option<&Baseline> {
        let city = Ustr::from_existing(city)?;
        self.baselines.get(&GroupKey { city, season })
    }

    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }
}

impl FromIterator<(GroupKey, Baseline)> for BaselineTable {
    fn from_iter<I: IntoIterator<Item = (GroupKey, Baseline)>>(iter: I) -> Self {
        Self {
            baselines: iter.into_iter().collect(),
        }
    }
}

/// Checks a live reading against the historical baseline of `city`/`season`.
pub fn is_anomaly(
    temperature: f64,
    table: &BaselineTable,
    city: &str,
    season: Season,
) -> Result<bool> {
    table
        .get(city, season)
        .map(|baseline| baseline.is_anomaly(temperature))
        .ok_or_else(|| Error::NoBaseline {
            city: city.to_string(),
            season,
        })
}
