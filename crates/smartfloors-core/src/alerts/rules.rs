//! Threshold classification of a single value

use crate::config::{Breach, LevelRule, ThresholdRule};
use crate::severity::SeverityLevel;

/// Outcome of checking a value against a variable's rule list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub level: SeverityLevel,
    pub breach: Breach,
}

/// Classify a value against rules declared from low to high severity
///
/// Minimum-style rules (`Range`, `Ceiling`) resolve to the last met rule, so
/// the highest applicable level wins. Comfort bands resolve to the narrowest
/// band breached. Returns `None` when no rule applies.
pub fn classify(rules: &[LevelRule], value: f32) -> Option<Classification> {
    let mut highest: Option<Classification> = None;
    let mut narrowest: Option<(f32, Classification)> = None;

    for rule in rules {
        let Some(breach) = rule.rule.breach(value) else {
            continue;
        };
        let hit = Classification {
            level: rule.level,
            breach,
        };

        match rule.rule {
            ThresholdRule::Band { low, high } => {
                let width = high - low;
                if narrowest.is_none_or(|(w, _)| width < w) {
                    narrowest = Some((width, hit));
                }
            }
            ThresholdRule::Range { .. } | ThresholdRule::Ceiling { .. } => highest = Some(hit),
        }
    }

    match (highest, narrowest.map(|(_, hit)| hit)) {
        (Some(a), Some(b)) => Some(if b.level > a.level { b } else { a }),
        (a, b) => a.or(b),
    }
}
