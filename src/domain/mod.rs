//! Domain types used throughout the engine.
//!
//! This module defines:
//!
//! - scored inputs (`ScoreRecord`, `ScorePopulation`, `CollectionsCohort`)
//! - model-type dispatch tags (`ModelType`, `MetricProfile`)
//! - engine outputs (`MetricSet`, `DecileBucket`, `RagStatus`, `Evaluation`)
//! - commentary inputs (`TrendSeries`)

pub mod types;

pub use types::*;
