// ⚠️ Chart Errors - Validation failures surfaced to the caller
// Every variant carries the offending value; nothing is silently defaulted.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartError {
    /// Symbol is not one of the ten stems
    #[error("invalid stem symbol: '{value}'")]
    InvalidStem { value: String },

    /// Symbol is not one of the twelve branches
    #[error("invalid branch symbol: '{value}'")]
    InvalidBranch { value: String },

    /// Pillar text is not exactly a stem followed by a branch
    #[error("malformed pillar '{value}': expected a stem followed by a branch")]
    MalformedPillar { value: String },

    #[error("expected {expected} {what}, got {actual}")]
    PillarCount {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid gender tag: '{value}'")]
    InvalidGender { value: String },

    /// Serialized structural summary is missing keys or has the wrong shape
    #[error("malformed structural summary: {message}")]
    MalformedSummary { message: String },
}

pub type ChartResult<T> = std::result::Result<T, ChartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_value() {
        let err = ChartError::InvalidStem {
            value: "X".to_string(),
        };
        assert_eq!(err.to_string(), "invalid stem symbol: 'X'");

        let err = ChartError::PillarCount {
            what: "stems",
            expected: 4,
            actual: 3,
        };
        assert_eq!(err.to_string(), "expected 4 stems, got 3");
    }
}
