//! IO-independent core library for smartfloors
//!
//! This crate contains the per-floor environmental monitoring loop without
//! any clock, terminal or file access: reading types, the bounded
//! time-series store, moving-average prediction, threshold classification,
//! the alert engine, the simulated correction controller, the simulated
//! reading source and the event types the live runtime publishes.
//!
//! The binary crate drives these pieces on a timer and persists the store.

pub mod alerts;
pub mod config;
pub mod correction;
pub mod events;
pub mod prediction;
pub mod readings;
pub mod severity;
pub mod source;
pub mod status;
pub mod storage;
