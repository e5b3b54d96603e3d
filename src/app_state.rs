//! Application-wide state and error types for smartfloors

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use thiserror_no_std::Error;

use smartfloors_core::config::ConfigError;
use smartfloors_core::events::EventChannel;

/// Global pub-sub channel for monitor events
/// The producer publishes; the dashboard and the notifier subscribe
pub static EVENT_CHANNEL: EventChannel = EventChannel::new();

/// Raised once to stop every task between ticks
pub static SHUTDOWN: Signal<CriticalSectionRawMutex, ()> = Signal::new();

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(ConfigError),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::InvalidConfig(err)
    }
}
