//! Monitoring configuration
//!
//! The configuration is an immutable object handed to every component at
//! construction. `Config::default()` carries the reference building setup:
//! three floors, the comfort/safety thresholds and the recommendation texts.

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::readings::{FloorId, Variable};
use crate::severity::SeverityLevel;

/// Maximum number of monitored floors
///
/// Per-floor control state lives in fixed-capacity maps of this size.
pub const MAX_FLOORS: usize = 16;

/// Placeholder substituted with the floor id in recommendation templates
pub const FLOOR_PLACEHOLDER: &str = "{floor}";

/// Which side of a comfort band a value fell out of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Breach {
    Low,
    High,
}

/// A single threshold rule for one severity level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThresholdRule {
    /// Met when the value is at or above `min`
    Range { min: f32 },
    /// Breached when the value leaves the closed interval `[low, high]`
    Band { low: f32, high: f32 },
    /// Met when the value is at or above `value`
    Ceiling { value: f32 },
}

impl ThresholdRule {
    /// Check a value against the rule
    ///
    /// Returns the side of the breach, or `None` when the rule is not met.
    pub fn breach(&self, value: f32) -> Option<Breach> {
        match *self {
            Self::Range { min } if value >= min => Some(Breach::High),
            Self::Ceiling { value: ceiling } if value >= ceiling => Some(Breach::High),
            Self::Band { low, .. } if value < low => Some(Breach::Low),
            Self::Band { high, .. } if value > high => Some(Breach::High),
            _ => None,
        }
    }

    /// Lower bound of a minimum-style rule
    pub fn minimum(&self) -> Option<f32> {
        match *self {
            Self::Range { min } => Some(min),
            Self::Ceiling { value } => Some(value),
            Self::Band { .. } => None,
        }
    }
}

/// A threshold rule tagged with the level it raises
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelRule {
    pub level: SeverityLevel,
    pub rule: ThresholdRule,
}

impl LevelRule {
    pub const fn new(level: SeverityLevel, rule: ThresholdRule) -> Self {
        Self { level, rule }
    }
}

/// Per-variable threshold rules, each list declared from low to high severity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub temperature: Vec<LevelRule>,
    pub humidity: Vec<LevelRule>,
    pub energy: Vec<LevelRule>,
}

impl Thresholds {
    pub fn rules(&self, variable: Variable) -> &[LevelRule] {
        match variable {
            Variable::Temperature => &self.temperature,
            Variable::Humidity => &self.humidity,
            Variable::Energy => &self.energy,
        }
    }

    /// Minimum value that raises `level` for a variable, if one is configured
    pub fn minimum(&self, variable: Variable, level: SeverityLevel) -> Option<f32> {
        self.rules(variable)
            .iter()
            .find(|r| r.level == level)
            .and_then(|r| r.rule.minimum())
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        use SeverityLevel::{Critical, Informational, Medium};
        use ThresholdRule::{Band, Ceiling, Range};

        Self {
            temperature: vec![
                LevelRule::new(Informational, Range { min: 26.0 }),
                LevelRule::new(Medium, Range { min: 28.0 }),
                LevelRule::new(Critical, Range { min: 29.5 }),
            ],
            humidity: vec![
                LevelRule::new(Informational, Band { low: 25.0, high: 70.0 }),
                LevelRule::new(Medium, Band { low: 22.0, high: 75.0 }),
                LevelRule::new(Critical, Band { low: 20.0, high: 80.0 }),
            ],
            energy: vec![
                LevelRule::new(Medium, Ceiling { value: 15.0 }),
                LevelRule::new(Critical, Ceiling { value: 18.0 }),
            ],
        }
    }
}

/// Structured lookup key for recommendation texts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecommendationKey {
    /// Current condition of a temperature or humidity reading
    Current {
        variable: Variable,
        level: SeverityLevel,
        #[serde(default)]
        breach: Option<Breach>,
    },
    /// Any energy alert, whatever its level
    EnergyLoad,
    /// Simultaneous thermal and electrical stress
    CombinedRisk,
    /// Temperature forecast above the medium threshold
    PreventiveTemperature,
}

/// Recommendation text with a `{floor}` slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecommendationTemplate(pub String);

impl RecommendationTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Substitute the floor slot
    pub fn render(&self, floor: FloorId) -> String {
        self.0.replace(FLOOR_PLACEHOLDER, &floor.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub key: RecommendationKey,
    pub template: RecommendationTemplate,
}

/// Recommendation lookup table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recommendations(pub Vec<Recommendation>);

impl Recommendations {
    pub fn get(&self, key: &RecommendationKey) -> Option<&RecommendationTemplate> {
        self.0.iter().find(|r| &r.key == key).map(|r| &r.template)
    }

    /// Resolve the text for a key, falling back to a generic review message
    pub fn resolve(&self, key: &RecommendationKey, subject: &str, floor: FloorId) -> String {
        match self.get(key) {
            Some(template) => template.render(floor),
            None => format!("Review {subject} on floor {floor}."),
        }
    }
}

impl Default for Recommendations {
    fn default() -> Self {
        use SeverityLevel::{Critical, Medium};

        let entry = |key, text: &str| Recommendation {
            key,
            template: RecommendationTemplate::new(text),
        };

        Self(vec![
            entry(
                RecommendationKey::Current {
                    variable: Variable::Temperature,
                    level: Medium,
                    breach: None,
                },
                "Adjust the floor {floor} setpoint to 24°C within the next 15 min.",
            ),
            entry(
                RecommendationKey::Current {
                    variable: Variable::Temperature,
                    level: Critical,
                    breach: None,
                },
                "Urgent HVAC and load review on floor {floor}. Adjust the setpoint immediately.",
            ),
            entry(
                RecommendationKey::Current {
                    variable: Variable::Humidity,
                    level: Critical,
                    breach: Some(Breach::Low),
                },
                "Schedule a thermal seal inspection on floor {floor} to prevent humidity loss.",
            ),
            entry(
                RecommendationKey::Current {
                    variable: Variable::Humidity,
                    level: Critical,
                    breach: Some(Breach::High),
                },
                "Increase ventilation on floor {floor}; check doors and louvers for excess humidity.",
            ),
            entry(
                RecommendationKey::EnergyLoad,
                "Redistribute electrical load from floor {floor} to a less loaded floor within the next hour.",
            ),
            entry(
                RecommendationKey::CombinedRisk,
                "CRITICAL RISK: imminent thermal overload. Redistribute electrical load on floor {floor} to prevent failures.",
            ),
            entry(
                RecommendationKey::PreventiveTemperature,
                "Forecast: floor {floor} may exceed the medium temperature threshold within 60 min. Adjust the setpoint preventively.",
            ),
        ])
    }
}

/// Simulated correction actuator settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    /// Ticks a correction stays active once triggered
    pub duration_ticks: u32,
    /// Added to temperature while active (°C)
    pub temperature_bias: f32,
    /// Added to energy while active (kW)
    pub energy_bias: f32,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            duration_ticks: 24,
            temperature_bias: -2.5,
            energy_bias: -4.0,
        }
    }
}

/// Retention window of the time-series store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub hours: u32,
    pub samples_per_minute: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            hours: 4,
            samples_per_minute: 1,
        }
    }
}

/// Reading source simulation settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Chance per floor and tick of an injected anomaly
    pub anomaly_probability: f64,
    /// History generated at startup when no persisted data exists
    pub backfill_hours: u32,
    /// Fixed RNG seed; entropy-seeded when absent
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            anomaly_probability: 0.08,
            backfill_hours: 4,
            seed: None,
        }
    }
}

/// Complete monitoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub building: String,
    pub floors: Vec<FloorId>,
    pub thresholds: Thresholds,
    pub recommendations: Recommendations,
    /// Samples averaged by the forecast
    pub prediction_window: usize,
    pub tick_interval_secs: u64,
    pub correction: CorrectionConfig,
    pub retention: RetentionConfig,
    pub simulation: SimulationConfig,
    /// Refresh period of the dashboard consumer
    pub dashboard_refresh_secs: u64,
    /// Persisted time-series log
    pub data_file: String,
    /// Stop the producer after this many ticks
    pub max_ticks: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            building: String::from("A"),
            floors: vec![1, 2, 3],
            thresholds: Thresholds::default(),
            recommendations: Recommendations::default(),
            prediction_window: 60,
            tick_interval_secs: 5,
            correction: CorrectionConfig::default(),
            retention: RetentionConfig::default(),
            simulation: SimulationConfig::default(),
            dashboard_refresh_secs: 5,
            data_file: String::from("smartfloors_data.csv"),
            max_ticks: None,
        }
    }
}

impl Config {
    /// Upper bound on the number of readings kept by the store
    pub fn max_records(&self) -> usize {
        self.retention.hours as usize
            * 60
            * self.retention.samples_per_minute as usize
            * self.floors.len()
    }

    /// Check the invariants the components rely on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.building.is_empty()
            || self.building.trim() != self.building
            || self.building.contains([',', '"', '\n', '\r'])
        {
            return Err(ConfigError::InvalidBuilding(self.building.clone()));
        }
        if self.floors.is_empty() {
            return Err(ConfigError::NoFloors);
        }
        if self.floors.len() > MAX_FLOORS {
            return Err(ConfigError::TooManyFloors {
                count: self.floors.len(),
                max: MAX_FLOORS,
            });
        }
        for (i, floor) in self.floors.iter().enumerate() {
            if self.floors[..i].contains(floor) {
                return Err(ConfigError::DuplicateFloor(*floor));
            }
        }
        if self.prediction_window == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.tick_interval_secs == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        if self.dashboard_refresh_secs == 0 {
            return Err(ConfigError::ZeroRefreshInterval);
        }
        if self.correction.duration_ticks == 0 {
            return Err(ConfigError::ZeroCorrectionDuration);
        }
        if self.max_records() == 0 {
            return Err(ConfigError::ZeroRetention);
        }
        if !(0.0..=1.0).contains(&self.simulation.anomaly_probability) {
            return Err(ConfigError::InvalidProbability);
        }
        for variable in Variable::ALL {
            let rules = self.thresholds.rules(variable);
            if rules.windows(2).any(|pair| pair[0].level >= pair[1].level) {
                return Err(ConfigError::UnorderedLevels {
                    variable: variable.name(),
                });
            }
        }
        Ok(())
    }
}

/// Configuration rejected by [`Config::validate`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Building names end up unquoted in the persisted log
    #[error("Building name '{0}' must be non-empty and trimmed, without commas, quotes or line breaks")]
    InvalidBuilding(String),
    #[error("No floors configured")]
    NoFloors,
    #[error("Too many floors: {count} (max: {max})")]
    TooManyFloors { count: usize, max: usize },
    #[error("Floor {0} is listed more than once")]
    DuplicateFloor(FloorId),
    #[error("Prediction window must hold at least one sample")]
    ZeroWindow,
    #[error("Tick interval must be at least one second")]
    ZeroTickInterval,
    #[error("Dashboard refresh interval must be at least one second")]
    ZeroRefreshInterval,
    #[error("Correction must last at least one tick")]
    ZeroCorrectionDuration,
    #[error("Retention window holds no records")]
    ZeroRetention,
    #[error("Anomaly probability must be within [0, 1]")]
    InvalidProbability,
    #[error("Threshold levels for {variable} must be declared from low to high")]
    UnorderedLevels { variable: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.max_records(), 4 * 60 * 3);
    }

    #[test]
    fn test_band_is_closed_on_both_ends() {
        let band = ThresholdRule::Band {
            low: 25.0,
            high: 70.0,
        };

        assert_eq!(band.breach(70.0), None);
        assert_eq!(band.breach(25.0), None);
        assert_eq!(band.breach(70.01), Some(Breach::High));
        assert_eq!(band.breach(24.99), Some(Breach::Low));
    }

    #[test]
    fn test_minimum_lookup() {
        let thresholds = Thresholds::default();

        assert_eq!(
            thresholds.minimum(Variable::Temperature, SeverityLevel::Medium),
            Some(28.0)
        );
        assert_eq!(
            thresholds.minimum(Variable::Energy, SeverityLevel::Medium),
            Some(15.0)
        );
        assert_eq!(
            thresholds.minimum(Variable::Humidity, SeverityLevel::Medium),
            None
        );
    }

    #[test]
    fn test_template_render() {
        let template = RecommendationTemplate::new("Check floor {floor} now");
        assert_eq!(template.render(3), "Check floor 3 now");
    }

    #[test]
    fn test_missing_recommendation_falls_back() {
        let recommendations = Recommendations::default();
        let key = RecommendationKey::Current {
            variable: Variable::Humidity,
            level: SeverityLevel::Informational,
            breach: Some(Breach::High),
        };

        assert_eq!(
            recommendations.resolve(&key, "humidity_pct", 2),
            "Review humidity_pct on floor 2."
        );
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        let mut config = Config::default();
        config.floors.clear();
        assert_eq!(config.validate(), Err(ConfigError::NoFloors));

        let mut config = Config::default();
        config.floors = (1..=17).collect();
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooManyFloors { count: 17, max: 16 })
        );

        let mut config = Config::default();
        config.floors = vec![1, 2, 1];
        assert_eq!(config.validate(), Err(ConfigError::DuplicateFloor(1)));

        let mut config = Config::default();
        config.thresholds.temperature.reverse();
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnorderedLevels { variable: "temp_C" })
        );

        let mut config = Config::default();
        config.correction.duration_ticks = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroCorrectionDuration));

        let mut config = Config::default();
        config.simulation.anomaly_probability = 1.5;
        assert_eq!(config.validate(), Err(ConfigError::InvalidProbability));

        let mut config = Config::default();
        config.dashboard_refresh_secs = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroRefreshInterval));
    }

    #[test]
    fn test_building_must_fit_a_log_field() {
        for name in ["Tower A, East", "\"A\"", "A\nB", " A", ""] {
            let config = Config {
                building: String::from(name),
                ..Config::default()
            };
            assert_eq!(
                config.validate(),
                Err(ConfigError::InvalidBuilding(String::from(name)))
            );
        }

        let config = Config {
            building: String::from("Tower A East"),
            ..Config::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }
}
