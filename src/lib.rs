//! Live runtime for smartfloors
//!
//! Wires the core monitoring loop to a clock, a persisted CSV log and the
//! terminal: the producer ticks the loop and persists the series, the
//! dashboard re-reads the log and prints floor status, and the notifier
//! prints the alert feed published on the event channel.

pub mod app_state;
pub mod config;
pub mod dashboard;
pub mod notifier;
pub mod producer;
pub mod storage;
