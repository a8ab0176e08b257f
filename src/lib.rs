//! `model-perf-monitor` library crate.
//!
//! The binary (`mpm`) is a thin wrapper around this library so that:
//!
//! - the metric engine is testable without spawning processes
//! - calling layers (services, notebooks, schedulers) can use the calculators
//!   directly on in-memory arrays
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod commentary;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod metrics;
pub mod report;
