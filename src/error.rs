// Typed errors with thiserror. Surface meaningful messages to JS and the CLI.
// See DESIGN.md: error

use thiserror::Error;

/// Engine error types.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid breakpoint table: {0}")]
    InvalidBreakpoints(String),

    #[error("Invalid timing table '{table}': {message}")]
    InvalidTimingTable { table: String, message: String },

    #[error("Timing table '{table}' declares {declared} frames but scenes add up to {computed}")]
    TotalFramesMismatch {
        table: String,
        declared: u32,
        computed: i64,
    },

    #[error("Unknown timing table: {0}")]
    UnknownTimingTable(String),

    #[error("Unknown composition: {0}")]
    UnknownComposition(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error at {path}: {message}")]
    Io { path: String, message: String },
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = EngineError::InvalidConfig("missing field".to_string());
        assert!(err.to_string().contains("missing field"));
    }

    #[test]
    fn mismatch_names_both_totals() {
        let err = EngineError::TotalFramesMismatch {
            table: "contentos".to_string(),
            declared: 300,
            computed: 310,
        };
        let msg = err.to_string();
        assert!(msg.contains("300"));
        assert!(msg.contains("310"));
    }

    #[test]
    fn serde_errors_convert() {
        let err: EngineError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, EngineError::Serialization(_)));
    }
}
