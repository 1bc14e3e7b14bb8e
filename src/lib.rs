//! Poller runtime: a long-running telemetry agent that schedules
//! collectors, shapes their results into in-memory metric matrices, runs
//! them through per-collector plugin chains and fans them out to shared
//! exporters.
//!
//! Collector and exporter classes are late-bound through compile-time
//! registries; the supervisor in [`poller`] owns both sides of the graph
//! and carries no knowledge of concrete classes beyond those registries.

pub mod cli;
pub mod collectors;
pub mod config;
pub mod error;
pub mod exporters;
pub mod matrix;
pub mod plugins;
pub mod poller;
pub mod schedule;
pub mod status;

pub use error::{Error, Result};
