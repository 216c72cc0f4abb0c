//! Error types for the synapse-processing engine

use thiserror::Error;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors that can occur in the synapse-processing engine
///
/// These are the fatal conditions of initialisation and platform access.
/// Operational events (queue overflow, ring saturation, unknown keys) are
/// never errors; they increment [`crate::pipeline::TickCounters`].
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shared-store layer error
    #[error("Storage error: {source}")]
    Storage {
        #[from]
        /// Source storage error
        source: synfire_storage::StorageError,
    },

    /// Invalid core configuration
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Reason for invalid configuration
        reason: String,
    },

    /// Invalid parameter value
    #[error("Invalid parameter {parameter}: {value} (expected {constraint})")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value
        value: String,
        /// Constraint description
        constraint: String,
    },
}

impl RuntimeError {
    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            constraint: constraint.into(),
        }
    }
}
