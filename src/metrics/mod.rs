//! Metric calculators.
//!
//! Every calculator is a pure function over caller-supplied data; nothing
//! here reads files or holds state, so all of it is safe to call from many
//! threads at once.

pub mod auc;
pub mod collections;
pub mod decile;
pub mod fraud;
pub mod ks;
pub mod profile;
pub mod psi;
pub mod rag;
pub mod ranking;
pub mod stability;

pub use profile::{compute_metric_set, evaluate, evaluate_cohort};
pub use ranking::RankedPopulation;
