//! Dashboard consumer
//!
//! Reads the persisted log on its own schedule, rebuilds a store from it and
//! recomputes the alert view. It never drives correction: evaluation goes
//! through a no-op sink. An unreadable log is shown as "waiting for data"
//! and retried on the next refresh.

use std::path::PathBuf;

use embassy_time::{Duration, Ticker};
use log::{debug, info, warn};

use smartfloors_core::alerts::{Alert, AlertEngine, AlertFilter, sort_by_severity};
use smartfloors_core::config::Config;
use smartfloors_core::prediction::Predictor;
use smartfloors_core::readings::{FloorId, Reading, Variable};
use smartfloors_core::status::{FloorStatus, floor_status};
use smartfloors_core::storage::TimeSeriesStore;

use crate::storage::{self, format_timestamp};

/// One floor's status card
#[derive(Debug, Clone, PartialEq)]
pub struct FloorCard {
    pub status: FloorStatus,
    pub latest: Option<Reading>,
    /// Temperature forecast (°C)
    pub forecast: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardView {
    Waiting,
    Ready {
        /// Newest timestamp in the log
        timestamp: u32,
        cards: Vec<FloorCard>,
        /// Filtered alert table, worst first
        alerts: Vec<Alert>,
    },
}

impl DashboardView {
    pub fn log(&self) {
        let DashboardView::Ready {
            timestamp,
            cards,
            alerts,
        } = self
        else {
            return;
        };

        info!("=== Floors at {} ===", format_timestamp(*timestamp));
        for card in cards {
            let forecast = card
                .forecast
                .map(|t| format!("{:.2} °C", t))
                .unwrap_or_else(|| String::from("n/a"));
            match &card.latest {
                Some(r) => info!(
                    "Floor {} [{}] {:.2} °C, {:.2} %, {:.2} kW, forecast {}: {}",
                    card.status.floor,
                    card.status.level,
                    r.temperature_c,
                    r.humidity_pct,
                    r.energy_kw,
                    forecast,
                    card.status.summary
                ),
                None => info!("Floor {} [{}] no data", card.status.floor, card.status.level),
            }
        }

        if alerts.is_empty() {
            info!("No alerts match the current filter");
        }
        for alert in alerts {
            info!("  {}", alert);
        }
    }
}

pub struct Dashboard {
    engine: AlertEngine,
    predictor: Predictor,
    floors: Vec<FloorId>,
    filter: AlertFilter,
    data_file: PathBuf,
    max_records: usize,
    waiting: bool,
}

impl Dashboard {
    pub fn new(config: &Config) -> Self {
        Self {
            engine: AlertEngine::new(config),
            predictor: Predictor::new(config.prediction_window),
            floors: config.floors.clone(),
            filter: AlertFilter::default(),
            data_file: PathBuf::from(&config.data_file),
            max_records: config.max_records(),
            waiting: false,
        }
    }

    pub fn with_filter(mut self, filter: AlertFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Re-read the log and rebuild the view
    pub fn refresh(&mut self) -> DashboardView {
        let readings = match storage::read_log(&self.data_file) {
            Ok(readings) => readings,
            Err(e) => {
                if self.waiting {
                    debug!("Still waiting for data: {}", e);
                } else {
                    warn!("Waiting for data: {}", e);
                }
                self.waiting = true;
                return DashboardView::Waiting;
            }
        };
        self.waiting = false;

        let store = TimeSeriesStore::from_history(self.max_records, readings);
        let Some(timestamp) = store.latest_timestamp() else {
            return DashboardView::Waiting;
        };

        let mut evaluation = self.engine.evaluate(&store);
        let cards = self
            .floors
            .iter()
            .map(|&floor| FloorCard {
                status: floor_status(&evaluation.alerts, floor),
                latest: store.latest(floor).cloned(),
                forecast: self.predictor.predict(&store, floor, Variable::Temperature),
            })
            .collect();

        sort_by_severity(&mut evaluation.alerts);
        let alerts = self
            .filter
            .apply(&evaluation.alerts)
            .into_iter()
            .cloned()
            .collect();

        DashboardView::Ready {
            timestamp,
            cards,
            alerts,
        }
    }

    /// Whether the last refresh found no usable data
    pub fn is_waiting(&self) -> bool {
        self.waiting
    }
}

/// Refresh and log the dashboard on a fixed period, forever
pub async fn run(mut dashboard: Dashboard, refresh: Duration) {
    let mut ticker = Ticker::every(refresh);
    loop {
        ticker.next().await;
        dashboard.refresh().log();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartfloors_core::severity::SeverityLevel;
    use std::fs;

    fn config(dir: &tempfile::TempDir) -> Config {
        Config {
            data_file: dir.path().join("data.csv").display().to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_waiting_until_data_arrives() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let mut dashboard = Dashboard::new(&config);

        assert_eq!(dashboard.refresh(), DashboardView::Waiting);
        assert!(dashboard.is_waiting());

        storage::write_atomic(
            &dir.path().join("data.csv"),
            &[Reading::new(60, "A", 1, 22.0, 50.0, 5.0)],
        )
        .unwrap();

        assert!(matches!(dashboard.refresh(), DashboardView::Ready { timestamp: 60, .. }));
        assert!(!dashboard.is_waiting());
    }

    #[test]
    fn test_malformed_log_is_waiting() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        fs::write(&config.data_file, "not,a,log\n").unwrap();

        assert_eq!(Dashboard::new(&config).refresh(), DashboardView::Waiting);
    }

    #[test]
    fn test_cards_and_filtered_alerts() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        storage::write_atomic(
            &dir.path().join("data.csv"),
            &[
                Reading::new(60, "A", 1, 26.5, 50.0, 5.0),
                Reading::new(60, "A", 3, 29.6, 50.0, 10.0),
            ],
        )
        .unwrap();

        let DashboardView::Ready { cards, alerts, .. } = Dashboard::new(&config).refresh() else {
            panic!("expected data");
        };

        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].status.level, SeverityLevel::Informational);
        assert_eq!(cards[0].forecast, Some(26.5));
        assert_eq!(cards[1].latest, None);
        assert_eq!(cards[1].status.level, SeverityLevel::Ok);
        assert_eq!(cards[2].status.level, SeverityLevel::Critical);

        // Informational alerts are filtered out; the worst comes first
        assert!(!alerts.is_empty());
        assert_eq!(alerts[0].floor, 3);
        assert_eq!(alerts[0].level, SeverityLevel::Critical);
        assert!(alerts.iter().all(|a| a.level != SeverityLevel::Informational));
    }
}
