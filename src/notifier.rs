//! Alert notifier
//!
//! Subscribes to the monitor event channel and reports alerts as they
//! appear, plus every correction start and finish. The alert set is
//! recomputed on every tick, so an alert is reported once when it first
//! shows up and again only after it has cleared.

use std::collections::HashSet;

use embassy_sync::pubsub::WaitResult;
use log::{info, warn};

use smartfloors_core::alerts::{Alert, AlertFilter, AlertSubject, sort_by_severity};
use smartfloors_core::events::{EventSubscriber, MonitorEvent};
use smartfloors_core::readings::FloorId;
use smartfloors_core::severity::SeverityLevel;

use crate::storage::format_timestamp;

type AlertKey = (FloorId, AlertSubject, SeverityLevel);

#[derive(Debug, Default)]
pub struct Notifier {
    filter: AlertFilter,
    active: HashSet<AlertKey>,
}

impl Notifier {
    pub fn new(filter: AlertFilter) -> Self {
        Self {
            filter,
            active: HashSet::new(),
        }
    }

    /// Handle one event, returning the notifications it produced
    pub fn handle(&mut self, event: &MonitorEvent) -> Vec<String> {
        let mut notes = Vec::new();

        match event {
            MonitorEvent::TickCompleted {
                timestamp, alerts, ..
            } => {
                let mut fresh: Vec<Alert> = alerts
                    .iter()
                    .filter(|a| self.filter.matches(a) && !self.active.contains(&key(a)))
                    .cloned()
                    .collect();
                sort_by_severity(&mut fresh);

                self.active = alerts.iter().map(key).collect();
                for alert in fresh {
                    notes.push(format!("{} {}", format_timestamp(*timestamp), alert));
                }
            }
            MonitorEvent::CorrectionStarted { floor, timestamp } => notes.push(format!(
                "{} correction started on floor {}",
                format_timestamp(*timestamp),
                floor
            )),
            MonitorEvent::CorrectionFinished { floor, timestamp } => notes.push(format!(
                "{} correction finished on floor {}",
                format_timestamp(*timestamp),
                floor
            )),
        }

        notes
    }
}

fn key(alert: &Alert) -> AlertKey {
    (alert.floor, alert.subject, alert.level)
}

/// Report events from `subscriber` forever
pub async fn run(mut notifier: Notifier, mut subscriber: EventSubscriber<'_>) {
    loop {
        match subscriber.next_message().await {
            WaitResult::Lagged(missed) => warn!("Notifier lagged behind, {} events missed", missed),
            WaitResult::Message(event) => {
                for note in notifier.handle(&event) {
                    info!("[Notify] {}", note);
                }
            }
        }
    }
}
