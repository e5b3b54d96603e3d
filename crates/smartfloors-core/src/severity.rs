//! Severity levels for alerts and floor status
//!
//! Levels are totally ordered so the worst alert of a floor can be picked
//! with a plain `max`.

use core::fmt::Display;

use serde::{Deserialize, Serialize};

/// Severity classification of a reading or a forecast
///
/// The declaration order is the severity order:
/// `Ok < Informational < PreventiveMedium < Medium < PreventiveCritical < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeverityLevel {
    /// Within every configured limit
    Ok,
    /// Slightly outside the comfort range
    Informational,
    /// Forecast expected to reach the medium threshold
    PreventiveMedium,
    /// Outside the acceptable range
    Medium,
    /// Forecast expected to reach the critical threshold
    PreventiveCritical,
    /// Requires immediate action; triggers correction
    Critical,
}

impl SeverityLevel {
    /// Get the display label for this level
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Informational => "Informational",
            Self::PreventiveMedium => "Preventive Medium",
            Self::Medium => "Medium",
            Self::PreventiveCritical => "Preventive Critical",
            Self::Critical => "Critical",
        }
    }

    /// The level with any preventive qualifier removed
    pub const fn without_preventive(self) -> Self {
        match self {
            Self::PreventiveMedium => Self::Medium,
            Self::PreventiveCritical => Self::Critical,
            other => other,
        }
    }

    pub const fn is_preventive(self) -> bool {
        matches!(self, Self::PreventiveMedium | Self::PreventiveCritical)
    }
}

impl Display for SeverityLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}
