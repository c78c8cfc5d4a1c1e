use std::{
    cmp::Ordering,
    time::{Duration, Instant},
};

use tracing::{debug, info};

use crate::{
    baseline::{annotate_group, GroupAnnotation},
    group_readings, smooth, AnnotatedReading, BaselineTable, Config, Dataset, Group, Result,
};

/// Applies one per-group task to every group.
///
/// Implementations must return results in the order the groups were given,
/// whatever order the work actually completes in.
pub trait Executor {
    fn name(&self) -> &'static str;

    fn run<T, F>(&self, groups: &[Group], task: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&Group) -> T + Sync;
}

/// Single-threaded, in group order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl Executor for Sequential {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn run<T, F>(&self, groups: &[Group], task: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&Group) -> T + Sync,
    {
        groups.iter().map(task).collect()
    }
}

#[derive(Debug, Clone)]
pub struct Annotation {
    pub strategy: &'static str,
    pub readings: Vec<AnnotatedReading>,
    pub baselines: BaselineTable,
    /// Wall-clock time of the per-group work, for benchmarking only.
    pub elapsed: Duration,
}

impl Annotation {
    pub fn anomalies(&self) -> impl Iterator<Item = &AnnotatedReading> {
        self.readings.iter().filter(|r| r.is_anomaly)
    }

    /// Same rows with the same values, ignoring row order.
    pub fn same_readings(&self, other: &Annotation) -> bool {
        if self.readings.len() != other.readings.len() {
            return false;
        }
        sorted_rows(&self.readings) == sorted_rows(&other.readings)
    }
}

/// Total order over every field of a row, so equal multisets sort identically.
fn row_order(a: &AnnotatedReading, b: &AnnotatedReading) -> Ordering {
    let moving_average = match (a.reading.moving_average, b.reading.moving_average) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (x, y) => x.is_some().cmp(&y.is_some()),
    };
    a.key()
        .cmp(&b.key())
        .then(a.reading.timestamp.cmp(&b.reading.timestamp))
        .then(a.reading.temperature.total_cmp(&b.reading.temperature))
        .then(moving_average)
        .then(a.is_anomaly.cmp(&b.is_anomaly))
        .then(a.average.total_cmp(&b.average))
        .then(a.std.total_cmp(&b.std))
        .then(a.lower_bound.total_cmp(&b.lower_bound))
        .then(a.upper_bound.total_cmp(&b.upper_bound))
}

fn sorted_rows(rows: &[AnnotatedReading]) -> Vec<AnnotatedReading> {
    let mut rows = rows.to_vec();
    rows.sort_by(row_order);
    rows
}

/// Runs baseline estimation and classification over every group with `executor`
/// and concatenates the results in group order.
pub fn annotate<E: Executor>(groups: &[Group], executor: &E, sigma: f64) -> Annotation {
    let start = Instant::now();
    let outcomes = executor.run(groups, |group| annotate_group(group, sigma));
    let elapsed = start.elapsed();

    let mut readings = Vec::with_capacity(groups.iter().map(Group::len).sum());
    let mut baselines = BaselineTable::default();
    for GroupAnnotation {
        key,
        baseline,
        readings: rows,
    } in outcomes
    {
        debug!(group = %key, %baseline, "group annotated");
        baselines.insert(key, baseline);
        readings.extend(rows);
    }

    info!(
        strategy = executor.name(),
        groups = groups.len(),
        rows = readings.len(),
        elapsed_ms = elapsed.as_secs_f64() * 1000.0,
        "annotation finished"
    );

    Annotation {
        strategy: executor.name(),
        readings,
        baselines,
        elapsed,
    }
}

/// Smooths, groups and annotates a whole dataset.
///
/// `config.workers` is not read here; build the executor with
/// `Parallel::from(config)` to honour it.
pub fn analyze<E: Executor>(
    dataset: &Dataset,
    config: &Config,
    executor: &E,
) -> Result<Annotation> {
    config.validate()?;
    let smoothed = smooth(dataset.readings(), config.window);
    let groups = group_readings(&smoothed);
    Ok(annotate(&groups, executor, config.sigma))
}
