use std::{cmp::Ordering, fmt::Display};

use ahash::AHashMap;
use ustr::Ustr;

use crate::{Season, SmoothedReading};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub city: Ustr,
    pub season: Season,
}

impl GroupKey {
    pub fn new(city: &str, season: Season) -> Self {
        Self {
            city: ustr::ustr(city),
            season,
        }
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.city
            .as_str()
            .cmp(other.city.as_str())
            .then(self.season.cmp(&other.season))
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.city, self.season)
    }
}

/// Readings sharing one (city, season) key. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    key: GroupKey,
    members: Vec<SmoothedReading>,
}

impl Group {
    pub fn key(&self) -> GroupKey {
        self.key
    }

    pub fn members(&self) -> &[SmoothedReading] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn temperatures(&self) -> impl Iterator<Item = f64> + '_ {
        self.members.iter().map(|m| m.temperature)
    }
}

/// Partitions readings by (city, season).
///
/// Members keep their arrival order within a group. Groups are emitted sorted
/// by city name, then season.
pub fn group_readings(readings: &[SmoothedReading]) -> Vec<Group> {
    let mut index: AHashMap<GroupKey, usize> = AHashMap::new();
    let mut groups: Vec<Group> = Vec::new();

    for reading in readings {
        let key = reading.key();
        match index.get(&key) {
            Some(&slot) => groups[slot].members.push(*reading),
            None => {
                index.insert(key, groups.len());
                groups.push(Group {
                    key,
                    members: vec![*reading],
                });
            }
        }
    }

    groups.sort_unstable_by_key(|g| g.key);
    groups
}
