//! Error types for labeled computations
//!
//! Flow violations in the static layer are compile errors and never reach
//! this type. What remains are run-time failures of readers and writers,
//! flow violations detected by the dynamic layer, and configuration errors.

use label_types::Level;
use thiserror::Error;

/// Main error type for running labeled computations
#[derive(Error, Debug)]
pub enum LioError {
    #[error("flow violation: data labeled {from} cannot flow to {to}")]
    FlowViolation { from: Level, to: Level },

    #[error("read from source labeled {label} failed: {source}")]
    Read {
        label: Level,
        #[source]
        source: anyhow::Error,
    },

    #[error("write to sink labeled {label} failed: {source}")]
    Write {
        label: Level,
        #[source]
        source: anyhow::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl LioError {
    pub fn is_flow_violation(&self) -> bool {
        matches!(self, LioError::FlowViolation { .. })
    }
}

/// Lattice policy validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("principal '{0}' is declared more than once")]
    DuplicatePrincipal(String),

    #[error("level '{level}' names undeclared principal '{principal}'")]
    UnknownPrincipal { level: String, principal: String },

    #[error("level '{0}' is not defined")]
    UnknownLevel(String),

    #[error("level name '{0}' is reserved")]
    ReservedLevelName(String),

    #[error("level '{level}' uses unknown keyword '{keyword}' (expected 'top' or 'bot')")]
    UnknownKeyword { level: String, keyword: String },

    #[error("channel '{0}' is not defined")]
    UnknownChannel(String),
}

pub type Result<T> = std::result::Result<T, LioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_violation_message_names_both_levels() {
        let err = LioError::FlowViolation {
            from: Level::singleton("alice"),
            to: Level::singleton("bob"),
        };
        assert!(err.is_flow_violation());
        assert_eq!(
            err.to_string(),
            "flow violation: data labeled {alice} cannot flow to {bob}"
        );
    }

    #[test]
    fn io_failures_keep_their_source() {
        let err = LioError::Read {
            label: Level::bot(),
            source: anyhow::anyhow!("disk on fire"),
        };
        assert!(!err.is_flow_violation());
        assert!(err.to_string().contains("disk on fire"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn config_errors_convert() {
        let err: LioError = ConfigError::UnknownLevel("secret".into()).into();
        assert_eq!(
            err.to_string(),
            "configuration error: level 'secret' is not defined"
        );
    }
}
