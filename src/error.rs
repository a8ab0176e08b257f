use thiserror::Error;

/// Caller-contract violations raised by the metrics engine.
///
/// Degenerate but legitimate data (an empty class, a zero-variance score
/// distribution, a single vintage) never produce one of these; those cases
/// have defined default values instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    #[error("length mismatch: {left_name} has {left} values but {right_name} has {right}")]
    LengthMismatch {
        left_name: &'static str,
        left: usize,
        right_name: &'static str,
        right: usize,
    },
    #[error("population is empty")]
    EmptyPopulation,
    #[error("invalid label {value} at index {index} (expected 0 or 1)")]
    InvalidLabel { index: usize, value: i64 },
    #[error("non-finite score at index {index}")]
    NonFiniteScore { index: usize },
    #[error("percentage must be finite and within (0, 100], got {0}")]
    InvalidPercent(f64),
    #[error("bin count must be at least 1")]
    InvalidBinCount,
    #[error("threshold must be finite, got {0}")]
    InvalidThreshold(f64),
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<MetricsError> for AppError {
    fn from(err: MetricsError) -> Self {
        AppError::new(3, format!("Metric computation failed: {err}"))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_error_maps_to_exit_code_three() {
        let err: AppError = MetricsError::EmptyPopulation.into();
        assert_eq!(err.exit_code(), 3);
        assert!(err.message().contains("population is empty"));
    }

    #[test]
    fn length_mismatch_names_both_sides() {
        let err = MetricsError::LengthMismatch {
            left_name: "labels",
            left: 3,
            right_name: "scores",
            right: 2,
        };
        assert_eq!(
            err.to_string(),
            "length mismatch: labels has 3 values but scores has 2"
        );
    }
}
