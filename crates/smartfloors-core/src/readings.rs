//! Telemetry readings and the variables they carry

use core::fmt::Display;

use serde::{Deserialize, Serialize};

/// Identifier of a monitored floor within the building
pub type FloorId = u16;

/// Measured variable of a floor reading
///
/// The display names double as the column names of the persisted log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variable {
    /// Air temperature in °C
    Temperature,
    /// Relative humidity in %
    Humidity,
    /// Electrical load in kW
    Energy,
}

impl Variable {
    /// All variables, in the order the alert engine checks them
    pub const ALL: [Variable; 3] = [Self::Temperature, Self::Humidity, Self::Energy];

    /// Column / display name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Temperature => "temp_C",
            Self::Humidity => "humidity_pct",
            Self::Energy => "energy_kW",
        }
    }

    /// Unit suffix for display
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::Humidity => "%",
            Self::Energy => "kW",
        }
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// One telemetry sample for one floor
///
/// Readings are never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Seconds since the Unix epoch
    pub timestamp: u32,
    pub building: String,
    pub floor: FloorId,
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub energy_kw: f32,
}

impl Reading {
    pub fn new(
        timestamp: u32,
        building: impl Into<String>,
        floor: FloorId,
        temperature_c: f32,
        humidity_pct: f32,
        energy_kw: f32,
    ) -> Self {
        Self {
            timestamp,
            building: building.into(),
            floor,
            temperature_c,
            humidity_pct,
            energy_kw,
        }
    }

    /// Value of a single variable
    pub fn value(&self, variable: Variable) -> f32 {
        match variable {
            Variable::Temperature => self.temperature_c,
            Variable::Humidity => self.humidity_pct,
            Variable::Energy => self.energy_kw,
        }
    }
}

impl Display for Reading {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "[Reading] timestamp: {}, building: {}, floor: {}, temperature: {:.2}°C, humidity: {:.2}%, energy: {:.2} kW",
            self.timestamp,
            self.building,
            self.floor,
            self.temperature_c,
            self.humidity_pct,
            self.energy_kw
        )
    }
}

/// Round to two decimal places, the precision of every recorded value
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
