//! Reading sources
//!
//! The live system is fed by [`SimulatedSource`], which produces one reading
//! per floor per tick from per-floor daily cycles plus noise. Random anomalies
//! (a heat and load spike) are injected on floors that are not under
//! correction; floors under correction get the controller's bias instead.

use core::f64::consts::TAU;

use log::debug;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::Config;
use crate::correction::CorrectionController;
use crate::readings::{FloorId, Reading, round2};

/// Temperature added by an injected anomaly (°C)
pub const ANOMALY_TEMPERATURE: f64 = 4.0;
/// Energy added by an injected anomaly (kW)
pub const ANOMALY_ENERGY: f64 = 7.0;

const MINUTES_PER_DAY: f64 = 24.0 * 60.0;

/// Producer of one reading per monitored floor per tick
pub trait ReadingSource {
    /// Generate the readings for `timestamp`
    ///
    /// The correction state is read, never modified.
    fn generate(&mut self, timestamp: u32, correction: &CorrectionController) -> Vec<Reading>;
}

/// Baseline behaviour of one floor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorProfile {
    pub base_temperature: f64,
    pub temperature_swing: f64,
    /// Extra short cycle: (period in minutes, amplitude in °C)
    pub short_cycle: Option<(f64, f64)>,
    pub base_humidity: f64,
    pub humidity_swing: f64,
    pub base_energy: f64,
    pub energy_swing: f64,
}

impl FloorProfile {
    /// Lowest floor: cooler, lighter electrical load
    pub const GROUND: Self = Self {
        base_temperature: 22.0,
        temperature_swing: 3.0,
        short_cycle: Some((6.0 * 60.0, 0.5)),
        base_humidity: 55.0,
        humidity_swing: 10.0,
        base_energy: 5.0,
        energy_swing: 4.0,
    };

    pub const INTERMEDIATE: Self = Self {
        base_temperature: 23.5,
        temperature_swing: 4.0,
        short_cycle: None,
        base_humidity: 60.0,
        humidity_swing: 11.0,
        base_energy: 7.5,
        energy_swing: 5.0,
    };

    /// Highest floor: warmer, heavier electrical load
    pub const TOP: Self = Self {
        base_temperature: 25.0,
        temperature_swing: 4.5,
        short_cycle: Some((4.0 * 60.0, 0.7)),
        base_humidity: 65.0,
        humidity_swing: 12.0,
        base_energy: 10.0,
        energy_swing: 6.0,
    };
}

/// Synthetic reading generator with anomaly injection
pub struct SimulatedSource {
    building: String,
    floors: Vec<(FloorId, FloorProfile)>,
    anomaly_probability: f64,
    rng: SmallRng,
}

impl SimulatedSource {
    pub fn new(config: &Config) -> Self {
        let rng = match config.simulation.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    pub fn with_seed(config: &Config, seed: u64) -> Self {
        Self::with_rng(config, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(config: &Config, rng: SmallRng) -> Self {
        let lowest = config.floors.iter().copied().min();
        let highest = config.floors.iter().copied().max();

        let floors = config
            .floors
            .iter()
            .map(|&floor| {
                let profile = if Some(floor) == lowest {
                    FloorProfile::GROUND
                } else if Some(floor) == highest {
                    FloorProfile::TOP
                } else {
                    FloorProfile::INTERMEDIATE
                };
                (floor, profile)
            })
            .collect();

        Self {
            building: config.building.clone(),
            floors,
            anomaly_probability: config.simulation.anomaly_probability,
            rng,
        }
    }

    /// The floor given the warm, heavily loaded profile
    pub fn top_floor(&self) -> Option<FloorId> {
        self.floors
            .iter()
            .find(|(_, p)| *p == FloorProfile::TOP)
            .or(self.floors.last())
            .map(|(floor, _)| *floor)
    }

    /// One-per-minute history for every floor, ending at `end_ts`
    ///
    /// No random anomalies are injected; `anomaly_floor` runs hot and loaded
    /// during the last hour, which seeds the live loop with a critical floor.
    pub fn history(&mut self, end_ts: u32, minutes: u32, anomaly_floor: Option<FloorId>) -> Vec<Reading> {
        let start_ts = end_ts.saturating_sub(minutes.saturating_sub(1) * 60);
        let mut readings = Vec::with_capacity(minutes as usize * self.floors.len());

        for i in 0..minutes {
            let ts = start_ts + i * 60;
            let recent = i + 60 > minutes;
            for idx in 0..self.floors.len() {
                let (floor, profile) = self.floors[idx];
                let (mut temperature, humidity, mut energy) = self.baseline(ts, &profile);
                if recent && Some(floor) == anomaly_floor {
                    temperature += ANOMALY_TEMPERATURE + self.rng.gen_range(-0.5..=0.5);
                    energy += ANOMALY_ENERGY + self.rng.gen_range(-0.8..=0.8);
                }
                readings.push(self.reading(ts, floor, temperature, humidity, energy));
            }
        }

        debug!("Generated {} history readings", readings.len());
        readings
    }

    /// Cycle plus noise for one floor at `timestamp`
    fn baseline(&mut self, timestamp: u32, profile: &FloorProfile) -> (f64, f64, f64) {
        let minutes = timestamp as f64 / 60.0;
        let daily = (minutes / MINUTES_PER_DAY * TAU).sin();

        let mut temperature = profile.base_temperature + profile.temperature_swing * daily;
        if let Some((period, amplitude)) = profile.short_cycle {
            temperature += amplitude * (minutes / period * TAU).sin();
        }
        let humidity = profile.base_humidity + profile.humidity_swing * daily;
        let energy = profile.base_energy + profile.energy_swing * daily;

        (
            temperature + self.rng.gen_range(-0.4..=0.4),
            humidity + self.rng.gen_range(-0.8..=0.8),
            energy + self.rng.gen_range(-0.3..=0.3),
        )
    }

    fn reading(&self, timestamp: u32, floor: FloorId, temperature: f64, humidity: f64, energy: f64) -> Reading {
        Reading::new(
            timestamp,
            self.building.as_str(),
            floor,
            round2(temperature) as f32,
            round2(humidity.clamp(0.0, 100.0)) as f32,
            round2(energy.max(0.0)) as f32,
        )
    }
}

impl ReadingSource for SimulatedSource {
    fn generate(&mut self, timestamp: u32, correction: &CorrectionController) -> Vec<Reading> {
        let mut readings = Vec::with_capacity(self.floors.len());

        for idx in 0..self.floors.len() {
            let (floor, profile) = self.floors[idx];
            let (mut temperature, humidity, mut energy) = self.baseline(timestamp, &profile);

            if let Some(bias) = correction.bias(floor) {
                temperature += bias.temperature as f64;
                energy += bias.energy as f64;
            } else if self.rng.gen_bool(self.anomaly_probability) {
                debug!("Injecting anomaly on floor {}", floor);
                temperature += ANOMALY_TEMPERATURE + self.rng.gen_range(-0.5..=0.5);
                energy += ANOMALY_ENERGY + self.rng.gen_range(-0.8..=0.8);
            }

            readings.push(self.reading(timestamp, floor, temperature, humidity, energy));
        }

        readings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::CorrectionSink;

    fn config(anomaly_probability: f64) -> Config {
        let mut config = Config::default();
        config.simulation.anomaly_probability = anomaly_probability;
        config
    }

    #[test]
    fn test_one_reading_per_floor() {
        let config = config(0.0);
        let controller = CorrectionController::from_config(&config).unwrap();
        let mut source = SimulatedSource::with_seed(&config, 7);

        let readings = source.generate(1_700_000_000, &controller);

        let floors: Vec<FloorId> = readings.iter().map(|r| r.floor).collect();
        assert_eq!(floors, vec![1, 2, 3]);
        assert!(readings.iter().all(|r| r.timestamp == 1_700_000_000));
        assert!(readings.iter().all(|r| r.building == "A"));
    }

    #[test]
    fn test_same_seed_same_readings() {
        let config = config(0.5);
        let controller = CorrectionController::from_config(&config).unwrap();

        let a = SimulatedSource::with_seed(&config, 42).generate(600, &controller);
        let b = SimulatedSource::with_seed(&config, 42).generate(600, &controller);
        assert_eq!(a, b);
    }

    #[test]
    fn test_correction_biases_instead_of_anomaly() {
        // Every free floor gets an anomaly; floor 1 is under correction
        let config = config(1.0);
        let mut controller = CorrectionController::from_config(&config).unwrap();
        controller.on_critical(1);

        let mut corrected = SimulatedSource::with_seed(&config, 3);
        let readings = corrected.generate(0, &controller);

        // Baseline at t=0 is the profile base; noise is at most ±0.4 °C / ±0.3 kW
        let floor1 = &readings[0];
        assert!(floor1.temperature_c <= 22.0 - 2.5 + 0.41);
        assert!(floor1.energy_kw <= 5.0 - 4.0 + 0.31);

        let floor3 = &readings[2];
        assert!(floor3.temperature_c >= 25.0 + 4.0 - 0.5 - 0.41);
        assert!(floor3.energy_kw >= 10.0 + 7.0 - 0.8 - 0.31);
    }

    #[test]
    fn test_history_spacing_and_recent_anomaly() {
        let config = config(0.0);
        let mut source = SimulatedSource::with_seed(&config, 1);
        let end = 10 * 24 * 3600;

        let history = source.history(end, 120, source.top_floor());

        assert_eq!(history.len(), 120 * 3);
        assert_eq!(history.first().map(|r| r.timestamp), Some(end - 119 * 60));
        assert_eq!(history.last().map(|r| r.timestamp), Some(end));

        // Last hour of the top floor carries the heat/load spike
        let top_recent: Vec<&Reading> = history
            .iter()
            .filter(|r| r.floor == 3 && r.timestamp > end - 59 * 60)
            .collect();
        assert!(top_recent.iter().all(|r| r.energy_kw > 14.0));
    }

    #[test]
    fn test_profiles_by_position() {
        let mut config = config(0.0);
        config.floors = vec![4, 5, 6, 7];
        let source = SimulatedSource::with_seed(&config, 0);

        assert_eq!(source.floors[0].1, FloorProfile::GROUND);
        assert_eq!(source.floors[1].1, FloorProfile::INTERMEDIATE);
        assert_eq!(source.floors[3].1, FloorProfile::TOP);
        assert_eq!(source.top_floor(), Some(7));
    }
}
