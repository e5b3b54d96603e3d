//! smartfloors: per-floor environmental monitoring with simulated correction
//!
//! Runs three tasks on the embassy std executor:
//!
//! | Task      | Period                   | Role                                   |
//! |-----------|--------------------------|----------------------------------------|
//! | producer  | `tick_interval_secs`     | generate, store, persist, alert, correct |
//! | dashboard | `dashboard_refresh_secs` | re-read the log, print floor status    |
//! | notifier  | on event                 | print new alerts and corrections       |
//!
//! Type `q` and Enter to quit. Verbosity follows `RUST_LOG` (default `info`).

use std::io::BufRead;

use embassy_executor::Spawner;
use embassy_futures::join::join3;
use embassy_futures::select::select;
use embassy_time::Duration;
use log::{error, info};

use smartfloors::app_state::{EVENT_CHANNEL, SHUTDOWN};
use smartfloors::config;
use smartfloors::dashboard::{self, Dashboard};
use smartfloors::notifier::{self, Notifier};
use smartfloors::producer::{self, Producer, now_timestamp};
use smartfloors_core::source::SimulatedSource;

/// Signal shutdown when `q` is entered on stdin
fn spawn_stdin_watcher() {
    std::thread::spawn(|| {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) if line.trim().eq_ignore_ascii_case("q") => {
                    SHUTDOWN.signal(());
                    break;
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
    });
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Starting smartfloors");

    let config = match config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Building {}, floors {:?}, data file {}",
        config.building, config.floors, config.data_file
    );

    let mut producer = match Producer::new(&config, SimulatedSource::new(&config)) {
        Ok(producer) => producer,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    producer.restore(now_timestamp(), config.simulation.backfill_hours);

    let (Ok(publisher), Ok(subscriber)) = (EVENT_CHANNEL.publisher(), EVENT_CHANNEL.subscriber())
    else {
        error!("Failed to attach to the event channel");
        std::process::exit(1);
    };

    spawn_stdin_watcher();
    info!("Type q and Enter to quit");

    let tasks = join3(
        producer::run(
            producer,
            publisher,
            Duration::from_secs(config.tick_interval_secs),
            config.max_ticks,
        ),
        dashboard::run(
            Dashboard::new(&config),
            Duration::from_secs(config.dashboard_refresh_secs),
        ),
        notifier::run(Notifier::default(), subscriber),
    );

    // Tasks only suspend between ticks, so dropping them never splits one
    select(tasks, SHUTDOWN.wait()).await;

    info!("smartfloors stopped");
    std::process::exit(0);
}
