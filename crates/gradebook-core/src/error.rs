//! Engine error types.
//!
//! Row- and cell-level problems during bulk operations are not errors: they
//! are dropped and counted. Only the cases below ever reach a caller.

use thiserror::Error;

/// Errors raised by the gradebook engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradebookError {
    /// A single score write fell outside [0, 100].
    #[error("score {value} is out of range (expected 0 to 100)")]
    OutOfRange { value: f64 },

    /// The grade-band table is malformed (gap, overlap or partial coverage).
    #[error("invalid grade band table: {0}")]
    Configuration(String),

    /// The uploaded sheet cannot be interpreted at all.
    #[error("unrecognised upload: {0}")]
    ParseStructure(String),
}

impl GradebookError {
    /// Returns `true` if the error invalidates a whole operation rather than
    /// a single cell.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GradebookError::Configuration(_) | GradebookError::ParseStructure(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification() {
        assert!(!GradebookError::OutOfRange { value: 101.0 }.is_fatal());
        assert!(GradebookError::Configuration("gap".into()).is_fatal());
        assert!(GradebookError::ParseStructure("empty".into()).is_fatal());
    }

    #[test]
    fn messages_name_the_problem() {
        let err = GradebookError::ParseStructure("missing header studentAdmissionNumber".into());
        assert!(err.to_string().contains("studentAdmissionNumber"));
        let err = GradebookError::OutOfRange { value: 150.0 };
        assert!(err.to_string().contains("150"));
    }
}
