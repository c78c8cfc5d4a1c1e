use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, PoisonError,
    },
    thread,
};

use nohash_hasher::IntMap;
use tracing::debug;

use crate::{config::DEFAULT_WORKERS, Config, Executor, Group};

/// Fixed-size pool of scoped worker threads, one group per unit of work.
///
/// Workers claim the next unprocessed group from a shared counter and keep
/// their results in a private map keyed by group position. The maps are merged
/// once every worker has finished, and the results are put back into group order.
#[derive(Debug, Clone, Copy)]
pub struct Parallel {
    workers: usize,
}

impl Parallel {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl Default for Parallel {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl From<&Config> for Parallel {
    fn from(config: &Config) -> Self {
        Self::new(config.workers)
    }
}

impl Executor for Parallel {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn run<T, F>(&self, groups: &[Group], task: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&Group) -> T + Sync,
    {
        let next = AtomicUsize::new(0);
        let merged: Mutex<IntMap<usize, T>> = Mutex::new(IntMap::default());
        let workers = self.workers.min(groups.len()).max(1);

        thread::scope(|scope| {
            for worker in 0..workers {
                let next = &next;
                let merged = &merged;
                let task = &task;
                scope.spawn(move || {
                    let mut local: IntMap<usize, T> = IntMap::default();
                    loop {
                        let slot = next.fetch_add(1, Ordering::Relaxed);
                        let Some(group) = groups.get(slot) else {
                            break;
                        };
                        local.insert(slot, task(group));
                    }
                    debug!(worker, groups = local.len(), "worker done");

                    let mut outer = merged.lock().unwrap_or_else(PoisonError::into_inner);
                    outer.extend(local);
                });
            }
        });

        let mut results = merged.into_inner().unwrap_or_else(PoisonError::into_inner);
        (0..groups.len())
            .filter_map(|slot| results.remove(&slot))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::{thread::ThreadId, time::Duration};

    use ahash::AHashSet;
    use chrono::NaiveDate;

    use super::*;
    use crate::{group_readings, smooth, Reading, Season, Sequential};

    fn groups(cities: usize) -> Vec<Group> {
        let ts = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let readings: Vec<Reading> = (0..cities * 3)
            .map(|i| {
                Reading::new(
                    ts,
                    &format!("city-{:02}", i % cities),
                    Season::ALL[i % 4],
                    i as f64 * 0.5,
                )
            })
            .collect();
        group_readings(&smooth(&readings, 5))
    }

    #[test]
    fn test_results_follow_group_order_despite_completion_order() {
        let groups = groups(8);
        let n = groups.len();
        // earlier groups sleep longer so they finish last
        let keys = Parallel::new(4).run(&groups, |g| {
            let pos = groups.iter().position(|x| x.key() == g.key()).unwrap();
            thread::sleep(Duration::from_millis(((n - pos) * 2) as u64));
            g.key()
        });
        let expected: Vec<_> = groups.iter().map(Group::key).collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_matches_sequential() {
        let groups = groups(10);
        let seq = Sequential.run(&groups, |g| g.temperatures().sum::<f64>());
        let par = Parallel::new(3).run(&groups, |g| g.temperatures().sum::<f64>());
        assert_eq!(seq, par);
    }

    #[test]
    fn test_uses_more_than_one_thread() {
        let groups = groups(12);
        let ids: Vec<ThreadId> = Parallel::new(4).run(&groups, |_| {
            thread::sleep(Duration::from_millis(5));
            thread::current().id()
        });
        let distinct: AHashSet<ThreadId> = ids.into_iter().collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn test_no_groups() {
        let out: Vec<usize> = Parallel::default().run(&[], Group::len);
        assert!(out.is_empty());
    }

    #[test]
    fn test_zero_workers_clamped() {
        assert_eq!(Parallel::new(0).workers(), 1);
        assert_eq!(Parallel::default().workers(), 4);
    }

    #[test]
    fn test_from_config_uses_workers() {
        let config = Config {
            workers: 7,
            ..Config::default()
        };
        assert_eq!(Parallel::from(&config).workers(), 7);
    }
}
