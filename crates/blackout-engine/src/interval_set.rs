//! A normalized set of disjoint closed intervals.
//!
//! The set is kept in maximal-merge normal form after every mutation: sorted
//! by start, pairwise disjoint, and no two neighbours touching. Touching counts
//! as overlap because the intervals are closed, so `[a, b]` and `[b, c]`
//! collapse into `[a, c]`.

use std::mem;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::interval::Interval;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawIntervalSet")]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored intervals, ascending by start.
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.intervals.iter()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// The earliest interval, if any.
    pub fn first(&self) -> Option<&Interval> {
        self.intervals.first()
    }

    /// Insert `interval` at its sorted position and merge every overlapping or
    /// touching neighbour into it.
    pub fn add(&mut self, interval: Interval) {
        let index = self
            .intervals
            .partition_point(|stored| stored.start() < interval.start());
        self.intervals.insert(index, interval);

        let mut merged: Vec<Interval> = Vec::with_capacity(self.intervals.len());
        for next in mem::take(&mut self.intervals) {
            if let Some(last) = merged.last_mut() {
                if last.end() >= next.start() {
                    *last = Interval::from_ordered(last.start(), last.end().max(next.end()));
                    continue;
                }
            }
            merged.push(next);
        }
        self.intervals = merged;
    }

    /// Cut `removed` out of every stored interval.
    ///
    /// Stored intervals fully covered by `removed` are dropped, disjoint ones are
    /// kept, and partially covered ones keep whatever lies outside `removed`.
    /// The remainders share an edge with `removed`. A zero-length `removed`
    /// strictly inside a stored interval leaves it whole, because the two
    /// closed remainders would touch.
    pub fn remove(&mut self, removed: Interval) {
        let mut kept = Vec::with_capacity(self.intervals.len() + 1);
        for stored in mem::take(&mut self.intervals) {
            if removed.start() <= stored.start() && removed.end() >= stored.end() {
                continue;
            }
            if removed.start() > stored.end() || removed.end() < stored.start() {
                kept.push(stored);
                continue;
            }
            if removed.start() == removed.end() {
                kept.push(stored);
                continue;
            }
            if removed.start() > stored.start() {
                kept.push(Interval::from_ordered(stored.start(), removed.start()));
            }
            if removed.end() < stored.end() {
                kept.push(Interval::from_ordered(removed.end(), stored.end()));
            }
        }
        self.intervals = kept;
    }

    /// A copy of `self` with each interval of `other` removed in turn.
    pub fn subtract(&self, other: &IntervalSet) -> IntervalSet {
        let mut result = self.clone();
        for interval in &other.intervals {
            result.remove(*interval);
        }
        result
    }

    /// Add every interval of `other`.
    pub fn extend(&mut self, other: &IntervalSet) {
        for interval in &other.intervals {
            self.add(*interval);
        }
    }

    /// The parts of the stored intervals that fall inside `period`.
    ///
    /// Intervals that only touch `period` at an edge contribute nothing.
    pub fn intersect_within(&self, period: Interval) -> IntervalSet {
        let mut result = IntervalSet::new();
        for stored in &self.intervals {
            if stored.end() <= period.start() {
                continue;
            }
            if stored.start() >= period.end() {
                break;
            }
            result.add(Interval::from_ordered(
                stored.start().max(period.start()),
                stored.end().min(period.end()),
            ));
        }
        result
    }

    /// The gaps between stored intervals, starting at `period.start` and
    /// running to `period.end`.
    pub fn invert_within(&self, period: Interval) -> IntervalSet {
        let mut result = IntervalSet::new();
        let mut cursor = period.start();
        for stored in &self.intervals {
            if stored.start() > cursor {
                result.add(Interval::from_ordered(cursor, stored.start()));
            }
            cursor = cursor.max(stored.end());
        }
        if cursor < period.end() {
            result.add(Interval::from_ordered(cursor, period.end()));
        }
        result
    }

    /// The first interval whose start is strictly after `instant`.
    ///
    /// An interval already containing `instant` is not considered.
    pub fn find_closest_future_interval(&self, instant: DateTime<Utc>) -> Option<&Interval> {
        let index = self
            .intervals
            .partition_point(|stored| stored.start() <= instant);
        self.intervals.get(index)
    }
}

impl<'a> IntoIterator for &'a IntervalSet {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}

impl FromIterator<Interval> for IntervalSet {
    fn from_iter<I: IntoIterator<Item = Interval>>(iter: I) -> Self {
        let mut set = IntervalSet::new();
        for interval in iter {
            set.add(interval);
        }
        set
    }
}

/// Snapshot form; intervals are re-normalized on the way in.
#[derive(Deserialize)]
struct RawIntervalSet {
    #[serde(default)]
    intervals: Vec<Interval>,
}

impl From<RawIntervalSet> for IntervalSet {
    fn from(raw: RawIntervalSet) -> Self {
        raw.intervals.into_iter().collect()
    }
}
