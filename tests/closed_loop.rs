//! End-to-end checks of the ingest, alert and correction feedback loop
//!
//! A scripted source replays fixed per-floor values and applies the
//! correction bias the same way the simulated source does, so the effect of
//! an activation can be observed in the following ticks' readings.

use smartfloors::producer::Producer;
use smartfloors::storage::read_log;
use smartfloors_core::config::Config;
use smartfloors_core::correction::CorrectionController;
use smartfloors_core::events::{EventChannel, MonitorEvent};
use smartfloors_core::readings::{FloorId, Reading};
use smartfloors_core::severity::SeverityLevel;
use smartfloors_core::source::ReadingSource;
use smartfloors_core::status::floor_status;

/// Fixed (floor, temperature, humidity, energy) values per tick
struct Scripted(Vec<(FloorId, f32, f32, f32)>);

impl ReadingSource for Scripted {
    fn generate(&mut self, timestamp: u32, correction: &CorrectionController) -> Vec<Reading> {
        self.0
            .iter()
            .map(|&(floor, temperature, humidity, energy)| {
                let (temperature, energy) = match correction.bias(floor) {
                    Some(b) => (temperature + b.temperature, energy + b.energy),
                    None => (temperature, energy),
                };
                Reading::new(timestamp, "A", floor, temperature, humidity, energy)
            })
            .collect()
    }
}

fn config(dir: &tempfile::TempDir, duration_ticks: u32) -> Config {
    let mut config = Config {
        data_file: dir.path().join("data.csv").display().to_string(),
        ..Config::default()
    };
    config.correction.duration_ticks = duration_ticks;
    config
}

#[test]
fn correction_applies_from_next_tick_for_its_duration() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, 3);
    let source = Scripted(vec![(1, 22.0, 50.0, 5.0), (3, 31.0, 50.0, 10.0)]);
    let mut producer = Producer::new(&config, source).unwrap();

    // Tick 1: unbiased critical reading starts the correction
    let first = producer.tick(60);
    assert_eq!(first.readings[1].temperature_c, 31.0);
    assert_eq!(first.evaluation.activated.as_slice(), &[3]);

    // Ticks 2 to 4: biased readings, no re-activation
    for ts in [120, 180, 240] {
        let outcome = producer.tick(ts);
        assert_eq!(outcome.readings[1].temperature_c, 28.5);
        assert_eq!(outcome.readings[1].energy_kw, 6.0);
        assert!(outcome.evaluation.activated.is_empty());
        assert!(!outcome.evaluation.critical_floors.contains(&3));
    }

    // Expiry happened during tick 4; tick 5 is unbiased and re-triggers
    let fifth = producer.tick(300);
    assert_eq!(fifth.readings[1].temperature_c, 31.0);
    assert_eq!(fifth.evaluation.activated.as_slice(), &[3]);

    assert!(producer.controller().is_active(3));
    assert!(!producer.controller().is_active(1));
    assert_eq!(read_log(producer.data_file()).unwrap().len(), 10);
}

#[test]
fn correction_expiry_is_published_on_the_tick_it_happens() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, 2);
    let source = Scripted(vec![(2, 30.0, 50.0, 5.0)]);
    let mut producer = Producer::new(&config, source).unwrap();

    let channel = EventChannel::new();
    let publisher = channel.publisher().unwrap();
    let mut subscriber = channel.subscriber().unwrap();

    for ts in [60, 120, 180] {
        for event in producer.tick(ts).events() {
            publisher.publish_immediate(event);
        }
    }

    let mut corrections = Vec::new();
    while let Some(event) = subscriber.try_next_message_pure() {
        match event {
            MonitorEvent::CorrectionStarted { floor, timestamp } => {
                corrections.push(("started", floor, timestamp))
            }
            MonitorEvent::CorrectionFinished { floor, timestamp } => {
                corrections.push(("finished", floor, timestamp))
            }
            _ => {}
        }
    }

    assert_eq!(
        corrections,
        vec![("started", 2, 60), ("finished", 2, 180)]
    );
}

#[test]
fn combined_risk_drives_correction() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, 24);
    let source = Scripted(vec![(2, 28.0, 50.0, 15.0)]);
    let mut producer = Producer::new(&config, source).unwrap();

    let outcome = producer.tick(60);

    // Both variables are only medium on their own
    let status = floor_status(&outcome.evaluation.alerts, 2);
    assert_eq!(status.level, SeverityLevel::Critical);
    assert!(status.summary.contains("combined risk"));
    assert_eq!(outcome.evaluation.activated.as_slice(), &[2]);

    // The bias brings both back under their medium thresholds
    let next = producer.tick(120);
    assert_eq!(next.readings[0].temperature_c, 25.5);
    assert_eq!(next.readings[0].energy_kw, 11.0);
    assert!(next.evaluation.critical_floors.is_empty());
}

#[test]
fn quiet_floors_stay_ok() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, 24);
    let source = Scripted(vec![
        (1, 22.0, 50.0, 5.0),
        (2, 23.0, 55.0, 7.0),
        (3, 24.0, 60.0, 9.0),
    ]);
    let mut producer = Producer::new(&config, source).unwrap();

    for ts in (1..=10).map(|i| i * 60) {
        let outcome = producer.tick(ts);
        assert!(outcome.evaluation.alerts.is_empty());
    }
    assert_eq!(producer.controller().active_floors().count(), 0);
}
