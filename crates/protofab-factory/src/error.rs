//! Factory and message error types.

use protofab_pool::PoolError;
use thiserror::Error;

/// Errors raised while registering schema batches or building message types.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// The registry rejected a file or a lookup failed.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// A different extension is already registered at this number.
    #[error("extension {conflicting} conflicts with {existing} at number {number} on {message}")]
    ExtensionConflict {
        message: String,
        number: u32,
        existing: String,
        conflicting: String,
    },

    /// A descriptor is inconsistent with the factory's registry.
    #[error("malformed descriptor {symbol}: {reason}")]
    Malformed { symbol: String, reason: String },
}

/// Result type alias for factory operations.
pub type FactoryResult<T> = Result<T, FactoryError>;

/// Errors raised by field access on a [`DynamicMessage`](crate::DynamicMessage).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("message {message} has no field {field}")]
    UnknownField { message: String, field: String },

    #[error("extension {extension} is not registered on {message}")]
    UnknownExtension { message: String, extension: String },

    #[error("field {field} expects {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },
}

/// Result type alias for message field access.
pub type MessageResult<T> = Result<T, MessageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_conflict_display() {
        let err = FactoryError::ExtensionConflict {
            message: "acme.Item".to_string(),
            number: 100,
            existing: "acme.ext.note".to_string(),
            conflicting: "acme.other.note".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("acme.Item"));
        assert!(msg.contains("100"));
        assert!(msg.contains("acme.ext.note"));
    }

    #[test]
    fn pool_errors_pass_through() {
        let err: FactoryError = PoolError::MissingDependency {
            file: "b.proto".to_string(),
            dependency: "a.proto".to_string(),
        }
        .into();
        assert!(format!("{err}").contains("a.proto"));
    }
}
