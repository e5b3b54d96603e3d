//! Per-floor simulated correction state machine
//!
//! ```text
//!            on_critical            tick (elapsed < duration)
//!   Idle ─────────────────▶ Active ◀──────────────────────┐
//!    ▲                        │ └────────────────────────────┘
//!    └────────────────────────┘
//!       tick (elapsed == duration), elapsed reset to 0
//! ```
//!
//! While a floor is active the reading source stops injecting anomalies and
//! adds the configured bias to temperature and energy. The controller is
//! owned by the producer: the alert engine activates it through the
//! [`CorrectionSink`] capability, the reading source only reads it.

use heapless::LinearMap;
use log::info;

use crate::config::{Config, ConfigError, CorrectionConfig, MAX_FLOORS};
use crate::readings::FloorId;

/// Live control state of one floor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrectionState {
    pub active: bool,
    pub elapsed_ticks: u32,
}

/// Additive adjustment applied to readings of a floor under correction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionBias {
    pub temperature: f32,
    pub energy: f32,
}

/// Receiver of critical detections from the alert engine
pub trait CorrectionSink {
    /// Request correction for a floor
    ///
    /// Returns `true` only when this call started a new correction.
    fn on_critical(&mut self, floor: FloorId) -> bool;
}

/// Sink for evaluations that must not drive the actuator
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl CorrectionSink for NoopSink {
    fn on_critical(&mut self, _floor: FloorId) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub struct CorrectionController {
    states: LinearMap<FloorId, CorrectionState, MAX_FLOORS>,
    duration_ticks: u32,
    bias: CorrectionBias,
}

impl CorrectionController {
    /// Create an idle controller for every monitored floor
    pub fn new(floors: &[FloorId], config: &CorrectionConfig) -> Result<Self, ConfigError> {
        let mut states = LinearMap::new();
        for &floor in floors {
            states
                .insert(floor, CorrectionState::default())
                .map_err(|_| ConfigError::TooManyFloors {
                    count: floors.len(),
                    max: MAX_FLOORS,
                })?;
        }

        Ok(Self {
            states,
            duration_ticks: config.duration_ticks,
            bias: CorrectionBias {
                temperature: config.temperature_bias,
                energy: config.energy_bias,
            },
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(&config.floors, &config.correction)
    }

    pub fn is_active(&self, floor: FloorId) -> bool {
        self.states.get(&floor).is_some_and(|s| s.active)
    }

    pub fn state(&self, floor: FloorId) -> Option<CorrectionState> {
        self.states.get(&floor).copied()
    }

    /// Bias for the reading source, `None` unless the floor is active
    pub fn bias(&self, floor: FloorId) -> Option<CorrectionBias> {
        self.is_active(floor).then_some(self.bias)
    }

    /// Advance an active floor by one tick
    ///
    /// Returns `true` when the correction expired on this tick. Idle and
    /// unknown floors are left untouched.
    pub fn tick(&mut self, floor: FloorId) -> bool {
        let Some(state) = self.states.get_mut(&floor) else {
            return false;
        };
        if !state.active {
            return false;
        }

        state.elapsed_ticks += 1;
        if state.elapsed_ticks >= self.duration_ticks {
            *state = CorrectionState::default();
            info!("Simulated correction finished on floor {}", floor);
            return true;
        }
        false
    }

    /// Advance every floor, returning those whose correction expired
    pub fn tick_all(&mut self) -> heapless::Vec<FloorId, MAX_FLOORS> {
        let floors: heapless::Vec<FloorId, MAX_FLOORS> = self.states.keys().copied().collect();
        floors.into_iter().filter(|&floor| self.tick(floor)).collect()
    }

    /// Floors currently under correction
    pub fn active_floors(&self) -> impl Iterator<Item = FloorId> + '_ {
        self.states
            .iter()
            .filter(|(_, s)| s.active)
            .map(|(floor, _)| *floor)
    }
}

impl CorrectionSink for CorrectionController {
    /// Idempotent: re-triggering an active floor keeps its timer running
    fn on_critical(&mut self, floor: FloorId) -> bool {
        match self.states.get_mut(&floor) {
            Some(state) if !state.active => {
                state.active = true;
                state.elapsed_ticks = 0;
                info!(
                    "Critical condition detected on floor {}, starting simulated correction",
                    floor
                );
                true
            }
            _ => false,
        }
    }
}
