use std::collections::VecDeque;

use log::{debug, warn};

use crate::readings::{FloorId, Reading, Variable};

/// Bounded, append-only log of floor readings
///
/// All floors share one ring buffer ordered by arrival. Appends that would
/// grow the buffer past `max_records` evict the oldest readings first, so the
/// retained records are always the most recent ones.
///
/// Each floor's stream keeps non-decreasing timestamps: a reading older than
/// the floor's latest one is dropped at append time.
#[derive(Debug, Clone)]
pub struct TimeSeriesStore {
    readings: VecDeque<Reading>,
    max_records: usize,
}

impl TimeSeriesStore {
    pub fn new(max_records: usize) -> Self {
        Self {
            readings: VecDeque::with_capacity(max_records),
            max_records,
        }
    }

    /// Build a store from an already ordered history, keeping the newest part
    pub fn from_history(max_records: usize, history: impl IntoIterator<Item = Reading>) -> Self {
        let mut store = Self::new(max_records);
        store.append(history);
        store
    }

    /// Append one tick worth of readings, then prune to the bound
    ///
    /// Returns the number of readings accepted.
    pub fn append(&mut self, readings: impl IntoIterator<Item = Reading>) -> usize {
        let mut accepted = 0;

        for reading in readings {
            if let Some(latest) = self.latest(reading.floor)
                && reading.timestamp < latest.timestamp
            {
                warn!(
                    "Dropping out-of-order reading for floor {} ({} < {})",
                    reading.floor, reading.timestamp, latest.timestamp
                );
                continue;
            }
            self.readings.push_back(reading);
            accepted += 1;
        }

        let mut evicted = 0;
        while self.readings.len() > self.max_records {
            self.readings.pop_front();
            evicted += 1;
        }
        if evicted > 0 {
            debug!("Evicted {} readings past retention", evicted);
        }

        accepted
    }

    /// Most recent reading of a floor, if the floor has any data
    pub fn latest(&self, floor: FloorId) -> Option<&Reading> {
        self.readings.iter().rev().find(|r| r.floor == floor)
    }

    /// Last `n` values of a variable for a floor, oldest first
    ///
    /// Returns fewer than `n` values when the history is shorter.
    pub fn window(&self, floor: FloorId, variable: Variable, n: usize) -> Vec<f32> {
        let mut values: Vec<f32> = self
            .readings
            .iter()
            .rev()
            .filter(|r| r.floor == floor)
            .take(n)
            .map(|r| r.value(variable))
            .collect();
        values.reverse();
        values
    }

    /// All readings strictly newer than `cutoff`
    pub fn all_since(&self, cutoff: u32) -> impl Iterator<Item = &Reading> {
        self.readings.iter().filter(move |r| r.timestamp > cutoff)
    }

    /// Newest timestamp across all floors
    pub fn latest_timestamp(&self) -> Option<u32> {
        self.readings.iter().map(|r| r.timestamp).max()
    }

    /// Read-only access to the whole retained series, oldest first
    pub fn readings(&self) -> &VecDeque<Reading> {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn max_records(&self) -> usize {
        self.max_records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(ts: u32, floor: FloorId, temp: f32) -> Reading {
        Reading::new(ts, "A", floor, temp, 50.0, 10.0)
    }

    #[test]
    fn test_prune_keeps_most_recent() {
        let mut store = TimeSeriesStore::new(6);

        for tick in 0..10u32 {
            store.append((1..=3).map(|floor| reading(tick * 5, floor, tick as f32)));
            assert!(store.len() <= 6);
        }

        let timestamps: Vec<u32> = store.readings().iter().map(|r| r.timestamp).collect();
        assert_eq!(timestamps, vec![40, 40, 40, 45, 45, 45]);
    }

    #[test]
    fn test_latest_absent_for_unknown_floor() {
        let mut store = TimeSeriesStore::new(10);
        assert!(store.latest(1).is_none());

        store.append([reading(0, 1, 21.0), reading(5, 1, 22.0)]);
        assert_eq!(store.latest(1).map(|r| r.temperature_c), Some(22.0));
        assert!(store.latest(2).is_none());
    }

    #[test]
    fn test_window_is_chronological_and_short_when_history_is() {
        let mut store = TimeSeriesStore::new(100);
        for i in 0..5u32 {
            store.append([reading(i, 1, i as f32), reading(i, 2, 100.0)]);
        }

        assert_eq!(store.window(1, Variable::Temperature, 3), vec![2.0, 3.0, 4.0]);
        assert_eq!(
            store.window(1, Variable::Temperature, 60),
            vec![0.0, 1.0, 2.0, 3.0, 4.0]
        );
        assert!(store.window(3, Variable::Temperature, 60).is_empty());
    }

    #[test]
    fn test_out_of_order_reading_is_dropped() {
        let mut store = TimeSeriesStore::new(10);

        assert_eq!(store.append([reading(10, 1, 21.0)]), 1);
        assert_eq!(store.append([reading(5, 1, 30.0), reading(5, 2, 30.0)]), 1);
        assert_eq!(store.latest(1).map(|r| r.timestamp), Some(10));
        assert_eq!(store.latest(2).map(|r| r.timestamp), Some(5));
    }

    #[test]
    fn test_all_since_is_exclusive() {
        let store = TimeSeriesStore::from_history(
            10,
            [reading(0, 1, 20.0), reading(5, 1, 21.0), reading(10, 1, 22.0)],
        );

        let newer: Vec<u32> = store.all_since(5).map(|r| r.timestamp).collect();
        assert_eq!(newer, vec![10]);
        assert_eq!(store.latest_timestamp(), Some(10));
    }
}
