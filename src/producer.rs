//! Producer task: the only writer of readings, alerts and correction state
//!
//! One tick runs, in order:
//!
//! 1. the source generates one reading per floor, reading the correction
//!    state of each floor (bias while active, no random anomaly)
//! 2. the controller advances every active floor and reports expiries
//! 3. the store appends the readings and prunes past its bound
//! 4. the pruned series replaces the persisted log
//! 5. the alert engine evaluates and starts correction on critical floors
//!
//! A correction started at tick N therefore first shows up in the readings
//! of tick N + 1. [`Producer::tick`] never suspends, so the async loop can
//! only be interrupted between ticks.

use std::path::{Path, PathBuf};

use embassy_time::{Duration, Ticker};
use log::{debug, error, info, warn};

use smartfloors_core::alerts::{AlertEngine, Evaluation};
use smartfloors_core::config::{Config, ConfigError, MAX_FLOORS};
use smartfloors_core::correction::CorrectionController;
use smartfloors_core::events::{EventPublisher, MonitorEvent};
use smartfloors_core::readings::{FloorId, Reading};
use smartfloors_core::source::{ReadingSource, SimulatedSource};
use smartfloors_core::storage::TimeSeriesStore;

use crate::app_state::SHUTDOWN;
use crate::storage::{self, LogError};

/// Current wall-clock time as epoch seconds
pub fn now_timestamp() -> u32 {
    u32::try_from(chrono::Utc::now().timestamp()).unwrap_or(u32::MAX)
}

/// Everything one tick produced
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub timestamp: u32,
    pub readings: Vec<Reading>,
    pub evaluation: Evaluation,
    /// Floors whose correction expired during this tick
    pub finished: heapless::Vec<FloorId, MAX_FLOORS>,
}

impl TickOutcome {
    /// Events for subscribers, in the order things happened within the tick
    pub fn events(&self) -> Vec<MonitorEvent> {
        let mut events = Vec::new();

        for &floor in &self.finished {
            events.push(MonitorEvent::CorrectionFinished {
                floor,
                timestamp: self.timestamp,
            });
        }
        events.push(MonitorEvent::TickCompleted {
            timestamp: self.timestamp,
            readings: self.readings.clone(),
            alerts: self.evaluation.alerts.clone(),
        });
        for &floor in &self.evaluation.activated {
            events.push(MonitorEvent::CorrectionStarted {
                floor,
                timestamp: self.timestamp,
            });
        }

        events
    }
}

pub struct Producer<R = SimulatedSource> {
    source: R,
    store: TimeSeriesStore,
    engine: AlertEngine<CorrectionController>,
    data_file: PathBuf,
    ticks: u64,
}

impl<R: ReadingSource> Producer<R> {
    pub fn new(config: &Config, source: R) -> Result<Self, ConfigError> {
        let controller = CorrectionController::from_config(config)?;

        Ok(Self {
            source,
            store: TimeSeriesStore::new(config.max_records()),
            engine: AlertEngine::with_sink(config, controller),
            data_file: PathBuf::from(&config.data_file),
            ticks: 0,
        })
    }

    /// Load the store from the persisted log
    pub fn resume(&mut self) -> Result<usize, LogError> {
        let history = storage::read_log(&self.data_file)?;
        let appended = self.store.append(history);
        info!(
            "Resumed {} readings from {}",
            appended,
            self.data_file.display()
        );
        Ok(appended)
    }

    /// Append `history` to the store and persist it
    pub fn seed(&mut self, history: impl IntoIterator<Item = Reading>) -> usize {
        let appended = self.store.append(history);
        self.persist();
        appended
    }

    /// Run one full tick at `timestamp`
    pub fn tick(&mut self, timestamp: u32) -> TickOutcome {
        let readings = self.source.generate(timestamp, self.engine.sink());
        let finished = self.engine.sink_mut().tick_all();

        self.store.append(readings.iter().cloned());
        self.persist();

        let evaluation = self.engine.evaluate(&self.store);
        self.ticks += 1;

        debug!(
            "Tick {} at {}: {} readings, {} alerts, {} floors under correction",
            self.ticks,
            timestamp,
            readings.len(),
            evaluation.alerts.len(),
            self.controller().active_floors().count()
        );

        TickOutcome {
            timestamp,
            readings,
            evaluation,
            finished,
        }
    }

    /// Replace the persisted log with the current store
    ///
    /// A failed write is logged; the in-memory store stays authoritative.
    fn persist(&self) {
        if let Err(e) = storage::write_atomic(&self.data_file, self.store.readings()) {
            error!(
                "Failed to write time-series log {}: {}",
                self.data_file.display(),
                e
            );
        }
    }

    pub fn store(&self) -> &TimeSeriesStore {
        &self.store
    }

    pub fn controller(&self) -> &CorrectionController {
        self.engine.sink()
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    /// Ticks completed since construction
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl Producer<SimulatedSource> {
    /// Seed the store with one-per-minute history ending at `now`
    ///
    /// The warm top floor runs hot during the last hour of history.
    pub fn backfill(&mut self, now: u32, hours: u32) -> usize {
        let anomaly_floor = self.source.top_floor();
        let history = self.source.history(now, hours * 60, anomaly_floor);
        let appended = self.seed(history);
        info!("Backfilled {} readings ({} hours)", appended, hours);
        appended
    }

    /// Resume from the persisted log, backfilling when it has no usable data
    pub fn restore(&mut self, now: u32, backfill_hours: u32) -> usize {
        match self.resume() {
            Ok(count) => count,
            Err(e) => {
                warn!("{}: {}, backfilling history", self.data_file.display(), e);
                self.backfill(now, backfill_hours)
            }
        }
    }
}

/// Tick on a fixed period, publishing each tick's events
///
/// Raises [`SHUTDOWN`] and returns after `max_ticks` ticks when set;
/// otherwise runs until the caller drops it.
pub async fn run<R: ReadingSource>(
    mut producer: Producer<R>,
    publisher: EventPublisher<'_>,
    tick_interval: Duration,
    max_ticks: Option<u64>,
) {
    let mut ticker = Ticker::every(tick_interval);
    info!(
        "Producer started, ticking every {} s",
        tick_interval.as_secs()
    );

    loop {
        ticker.next().await;

        let outcome = producer.tick(now_timestamp());
        for event in outcome.events() {
            publisher.publish_immediate(event);
        }

        if let Some(max) = max_ticks
            && producer.ticks() >= max
        {
            info!("Reached {} ticks, shutting down", max);
            SHUTDOWN.signal(());
            break;
        }
    }

    info!("Producer stopped after {} ticks", producer.ticks());
}
