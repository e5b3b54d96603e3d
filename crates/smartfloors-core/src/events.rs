//! Events published by the producer after each tick

use core::fmt::{self, Display};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pubsub::{PubSubChannel, Publisher, Subscriber};

use crate::alerts::Alert;
use crate::readings::{FloorId, Reading};

/// Channel capacity for monitor events
/// A tick publishes at most 1 + 2 * MAX_FLOORS events; lagging subscribers skip ahead
pub const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Number of subscribers that can listen to monitor events
/// - Subscriber 0: notifier
/// - Subscriber 1: spare (tests, extra sinks)
///
/// The dashboard reads the persisted log instead of subscribing.
pub const EVENT_SUBSCRIBERS: usize = 2;

/// Number of publishers (just the producer)
pub const EVENT_PUBLISHERS: usize = 1;

pub type EventChannel = PubSubChannel<
    CriticalSectionRawMutex,
    MonitorEvent,
    EVENT_CHANNEL_CAPACITY,
    EVENT_SUBSCRIBERS,
    EVENT_PUBLISHERS,
>;

pub type EventPublisher<'a> = Publisher<
    'a,
    CriticalSectionRawMutex,
    MonitorEvent,
    EVENT_CHANNEL_CAPACITY,
    EVENT_SUBSCRIBERS,
    EVENT_PUBLISHERS,
>;

pub type EventSubscriber<'a> = Subscriber<
    'a,
    CriticalSectionRawMutex,
    MonitorEvent,
    EVENT_CHANNEL_CAPACITY,
    EVENT_SUBSCRIBERS,
    EVENT_PUBLISHERS,
>;

/// Events published by the producer to notify subscribers of a completed tick
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// Readings appended and alerts recomputed for `timestamp`
    TickCompleted {
        timestamp: u32,
        readings: Vec<Reading>,
        alerts: Vec<Alert>,
    },
    CorrectionStarted { floor: FloorId, timestamp: u32 },
    CorrectionFinished { floor: FloorId, timestamp: u32 },
}

impl Display for MonitorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorEvent::TickCompleted {
                timestamp,
                readings,
                alerts,
            } => write!(
                f,
                "[Tick] timestamp: {}, readings: {}, alerts: {}",
                timestamp,
                readings.len(),
                alerts.len()
            ),
            MonitorEvent::CorrectionStarted { floor, timestamp } => {
                write!(f, "[Correction] floor {} started at {}", floor, timestamp)
            }
            MonitorEvent::CorrectionFinished { floor, timestamp } => {
                write!(f, "[Correction] floor {} finished at {}", floor, timestamp)
            }
        }
    }
}
