//! Per-floor status summary for status cards

use crate::alerts::Alert;
use crate::readings::FloorId;
use crate::severity::SeverityLevel;

/// Summary shown when a floor has no alerts
pub const NO_ISSUES_SUMMARY: &str = "No efficiency or comfort issues.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorStatus {
    pub floor: FloorId,
    /// Worst level among the floor's alerts, preventive qualifier removed
    pub level: SeverityLevel,
    pub summary: String,
}

/// Summarize the alerts of one floor
///
/// Pure function of the current alert set.
pub fn floor_status(alerts: &[Alert], floor: FloorId) -> FloorStatus {
    let mut level = SeverityLevel::Ok;
    let mut subjects: Vec<&'static str> = Vec::new();

    for alert in alerts.iter().filter(|a| a.floor == floor) {
        level = level.max(alert.level);
        let name = alert.subject.name();
        if !subjects.contains(&name) {
            subjects.push(name);
        }
    }

    let summary = if subjects.is_empty() {
        String::from(NO_ISSUES_SUMMARY)
    } else {
        format!("{} out of range.", subjects.join(", "))
    };

    FloorStatus {
        floor,
        level: level.without_preventive(),
        summary,
    }
}

/// Status of every floor, in the given order
pub fn all_statuses(alerts: &[Alert], floors: &[FloorId]) -> Vec<FloorStatus> {
    floors.iter().map(|&floor| floor_status(alerts, floor)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{AlertEngine, AlertKind, AlertSubject};
    use crate::config::Config;
    use crate::readings::{Reading, Variable};
    use crate::storage::TimeSeriesStore;

    fn alert(floor: FloorId, subject: AlertSubject, level: SeverityLevel) -> Alert {
        Alert {
            timestamp: 0,
            floor,
            subject,
            level,
            recommendation: String::new(),
            kind: AlertKind::Current,
        }
    }

    #[test]
    fn test_no_alerts_is_ok() {
        let status = floor_status(&[], 1);
        assert_eq!(status.level, SeverityLevel::Ok);
        assert_eq!(status.summary, NO_ISSUES_SUMMARY);
    }

    #[test]
    fn test_worst_level_and_distinct_subjects() {
        let alerts = vec![
            alert(1, AlertSubject::Variable(Variable::Temperature), SeverityLevel::Medium),
            alert(1, AlertSubject::TemperatureForecast, SeverityLevel::PreventiveMedium),
            alert(1, AlertSubject::Variable(Variable::Temperature), SeverityLevel::Medium),
            alert(2, AlertSubject::CombinedRisk, SeverityLevel::Critical),
        ];

        let status = floor_status(&alerts, 1);
        assert_eq!(status.level, SeverityLevel::Medium);
        assert_eq!(status.summary, "temp_C, temperature (prediction) out of range.");
    }

    #[test]
    fn test_preventive_only_floor_displays_without_qualifier() {
        let alerts = vec![alert(
            3,
            AlertSubject::TemperatureForecast,
            SeverityLevel::PreventiveMedium,
        )];

        assert_eq!(floor_status(&alerts, 3).level, SeverityLevel::Medium);
    }

    #[test]
    fn test_end_to_end_single_critical_reading() {
        let config = Config::default();
        let store = TimeSeriesStore::from_history(
            config.max_records(),
            [Reading::new(0, "A", 1, 29.6, 50.0, 10.0)],
        );

        let evaluation = AlertEngine::new(&config).evaluate(&store);
        let status = floor_status(&evaluation.alerts, 1);

        assert_eq!(status.level.label(), "Critical");
        assert!(status.summary.contains("temp_C"));
    }

    #[test]
    fn test_end_to_end_empty_store_is_ok_everywhere() {
        let config = Config::default();
        let store = TimeSeriesStore::new(config.max_records());

        let evaluation = AlertEngine::new(&config).evaluate(&store);
        assert!(evaluation.alerts.is_empty());

        for status in all_statuses(&evaluation.alerts, &config.floors) {
            assert_eq!(status.level, SeverityLevel::Ok);
        }
    }
}
