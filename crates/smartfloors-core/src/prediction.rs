//! Moving-average forecast
//!
//! The forecast for a variable is the arithmetic mean of its last `window`
//! samples, rounded to two decimals. There is no trend term: the flat mean is
//! what the preventive alert thresholds were tuned against.

use crate::readings::{FloorId, Variable, round2};
use crate::storage::TimeSeriesStore;

/// Default number of samples averaged (one hour at one sample per minute)
pub const DEFAULT_WINDOW: usize = 60;

#[derive(Debug, Clone, Copy)]
pub struct Predictor {
    window: usize,
}

impl Default for Predictor {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl Predictor {
    pub const fn new(window: usize) -> Self {
        Self { window }
    }

    pub const fn window(&self) -> usize {
        self.window
    }

    /// Forecast a variable for a floor
    ///
    /// Uses every available sample when fewer than `window` exist; returns
    /// `None` when the floor has no history at all.
    pub fn predict(&self, store: &TimeSeriesStore, floor: FloorId, variable: Variable) -> Option<f32> {
        mean(&store.window(floor, variable, self.window))
    }
}

/// Mean of the samples rounded to two decimals, `None` for an empty slice
pub fn mean(samples: &[f32]) -> Option<f32> {
    if samples.is_empty() {
        return None;
    }

    // Accumulate in f64 so long windows don't drift
    let sum: f64 = samples.iter().map(|&v| v as f64).sum();
    Some(round2(sum / samples.len() as f64) as f32)
}
