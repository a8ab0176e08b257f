//! Reporting: terminal formatting of evaluation, trend and stability runs.

pub mod format;

pub use format::*;
