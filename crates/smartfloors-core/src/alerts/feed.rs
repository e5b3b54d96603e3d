//! Alert feed helpers for downstream consumers

use crate::readings::FloorId;
use crate::severity::SeverityLevel;

use super::Alert;

/// Selection of alerts by floor and level
///
/// An empty `floors` list selects every floor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertFilter {
    pub floors: Vec<FloorId>,
    pub levels: Vec<SeverityLevel>,
}

impl Default for AlertFilter {
    /// Actionable levels on every floor
    fn default() -> Self {
        Self {
            floors: Vec::new(),
            levels: vec![
                SeverityLevel::Critical,
                SeverityLevel::Medium,
                SeverityLevel::PreventiveMedium,
            ],
        }
    }
}

impl AlertFilter {
    pub fn matches(&self, alert: &Alert) -> bool {
        (self.floors.is_empty() || self.floors.contains(&alert.floor))
            && self.levels.contains(&alert.level)
    }

    pub fn apply<'a>(&self, alerts: &'a [Alert]) -> Vec<&'a Alert> {
        alerts.iter().filter(|a| self.matches(a)).collect()
    }
}

/// Sort by severity, worst first, keeping engine order among equals
pub fn sort_by_severity(alerts: &mut [Alert]) {
    alerts.sort_by(|a, b| b.level.cmp(&a.level));
}
