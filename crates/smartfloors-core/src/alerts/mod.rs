//! Alert engine
//!
//! Every tick the engine recomputes the full alert set from the latest
//! reading of each floor and the floor's temperature forecast. The alert set
//! is a derived view, not a log: nothing carries over between evaluations.
//!
//! Per floor, alerts are produced in a fixed order:
//!
//! 1. current temperature
//! 2. current humidity
//! 3. current energy
//! 4. preventive temperature (forecast at or above the medium threshold)
//! 5. combined risk (temperature and energy both at or above medium)
//!
//! A floor is critical when a current check reaches `Critical` or the
//! combined-risk rule fires. Only critical floors are handed to the
//! [`CorrectionSink`].

pub mod feed;
pub mod rules;

use core::fmt::Display;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::{Config, MAX_FLOORS, RecommendationKey, Recommendations, Thresholds};
use crate::correction::{CorrectionSink, NoopSink};
use crate::prediction::Predictor;
use crate::readings::{FloorId, Reading, Variable};
use crate::severity::SeverityLevel;
use crate::storage::TimeSeriesStore;

pub use feed::*;
pub use rules::{Classification, classify};

/// Whether an alert comes from the current reading or from the forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    Current,
    Preventive,
}

impl AlertKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Current => "Current",
            Self::Preventive => "Preventive",
        }
    }
}

/// What an alert is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertSubject {
    Variable(Variable),
    CombinedRisk,
    TemperatureForecast,
}

impl AlertSubject {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Variable(variable) => variable.name(),
            Self::CombinedRisk => "combined risk",
            Self::TemperatureForecast => "temperature (prediction)",
        }
    }
}

impl Display for AlertSubject {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Newest timestamp in the store at evaluation time
    pub timestamp: u32,
    pub floor: FloorId,
    pub subject: AlertSubject,
    pub level: SeverityLevel,
    pub recommendation: String,
    pub kind: AlertKind,
}

impl Display for Alert {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "[{}] floor {} {} ({}): {}",
            self.level,
            self.floor,
            self.subject,
            self.kind.label(),
            self.recommendation
        )
    }
}

/// Result of one evaluation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// Alerts in per-floor check order
    pub alerts: Vec<Alert>,
    /// Floors flagged critical this pass
    pub critical_floors: heapless::Vec<FloorId, MAX_FLOORS>,
    /// Critical floors whose correction was started by this pass
    pub activated: heapless::Vec<FloorId, MAX_FLOORS>,
}

/// Threshold, forecast and combined-risk evaluator
///
/// The sink receives critical detections. Evaluations that must not drive
/// the actuator (a read-only dashboard, for instance) use [`NoopSink`].
#[derive(Debug, Clone)]
pub struct AlertEngine<S = NoopSink> {
    floors: Vec<FloorId>,
    thresholds: Thresholds,
    recommendations: Recommendations,
    predictor: Predictor,
    sink: S,
}

impl AlertEngine<NoopSink> {
    pub fn new(config: &Config) -> Self {
        Self::with_sink(config, NoopSink)
    }
}

impl<S: CorrectionSink> AlertEngine<S> {
    pub fn with_sink(config: &Config, sink: S) -> Self {
        Self {
            floors: config.floors.clone(),
            thresholds: config.thresholds.clone(),
            recommendations: config.recommendations.clone(),
            predictor: Predictor::new(config.prediction_window),
            sink,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Evaluate every monitored floor against the store
    ///
    /// Floors without data are skipped for this pass.
    pub fn evaluate(&mut self, store: &TimeSeriesStore) -> Evaluation {
        let mut evaluation = Evaluation::default();
        let Some(timestamp) = store.latest_timestamp() else {
            return evaluation;
        };

        for &floor in &self.floors {
            let Some(latest) = store.latest(floor) else {
                debug!("No readings for floor {} yet, skipping", floor);
                continue;
            };

            let critical = self.evaluate_floor(store, latest, timestamp, &mut evaluation.alerts);
            if critical {
                if evaluation.critical_floors.push(floor).is_err() {
                    warn!(
                        "More than {} critical floors, floor {} not sent to correction",
                        MAX_FLOORS, floor
                    );
                    continue;
                }
                if self.sink.on_critical(floor) {
                    // Never longer than critical_floors
                    let _ = evaluation.activated.push(floor);
                }
            }
        }

        evaluation
    }

    /// Append the alerts of one floor, returning whether it is critical
    fn evaluate_floor(
        &self,
        store: &TimeSeriesStore,
        latest: &Reading,
        timestamp: u32,
        alerts: &mut Vec<Alert>,
    ) -> bool {
        let floor = latest.floor;
        let mut critical = false;

        for variable in Variable::ALL {
            let Some(hit) = classify(self.thresholds.rules(variable), latest.value(variable)) else {
                continue;
            };
            critical |= hit.level == SeverityLevel::Critical;

            let key = Self::current_key(variable, hit);
            alerts.push(Alert {
                timestamp,
                floor,
                subject: AlertSubject::Variable(variable),
                level: hit.level,
                recommendation: self.recommendations.resolve(&key, variable.name(), floor),
                kind: AlertKind::Current,
            });
        }

        let medium_temperature = self
            .thresholds
            .minimum(Variable::Temperature, SeverityLevel::Medium);
        let medium_energy = self.thresholds.minimum(Variable::Energy, SeverityLevel::Medium);

        if let (Some(forecast), Some(threshold)) = (
            self.predictor.predict(store, floor, Variable::Temperature),
            medium_temperature,
        ) && forecast >= threshold
        {
            let subject = AlertSubject::TemperatureForecast;
            alerts.push(Alert {
                timestamp,
                floor,
                subject,
                level: SeverityLevel::PreventiveMedium,
                recommendation: self.recommendations.resolve(
                    &RecommendationKey::PreventiveTemperature,
                    subject.name(),
                    floor,
                ),
                kind: AlertKind::Preventive,
            });
        }

        if let (Some(temperature), Some(energy)) = (medium_temperature, medium_energy)
            && latest.temperature_c >= temperature
            && latest.energy_kw >= energy
        {
            let subject = AlertSubject::CombinedRisk;
            alerts.push(Alert {
                timestamp,
                floor,
                subject,
                level: SeverityLevel::Critical,
                recommendation: self.recommendations.resolve(
                    &RecommendationKey::CombinedRisk,
                    subject.name(),
                    floor,
                ),
                kind: AlertKind::Current,
            });
            critical = true;
        }

        critical
    }

    fn current_key(variable: Variable, hit: Classification) -> RecommendationKey {
        match variable {
            Variable::Energy => RecommendationKey::EnergyLoad,
            Variable::Humidity => RecommendationKey::Current {
                variable,
                level: hit.level,
                breach: Some(hit.breach),
            },
            Variable::Temperature => RecommendationKey::Current {
                variable,
                level: hit.level,
                breach: None,
            },
        }
    }
}
