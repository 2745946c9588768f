//! Registry error types.
//!
//! Every rejection carries the offending file so that a failing batch can be
//! traced back to the descriptor that caused it.

use std::ops::Range;

use protofab_core::DescriptorError;
use thiserror::Error;

/// Errors raised by [`DescriptorPool`](crate::DescriptorPool) lookups and
/// insertions.
#[derive(Debug, Error)]
pub enum PoolError {
    /// A lookup named something the registry does not hold.
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// A file imports another file that has not been registered yet.
    #[error("file {file} depends on {dependency}, which is not registered")]
    MissingDependency { file: String, dependency: String },

    /// A different file was already registered under the same name.
    #[error("file {file} conflicts with a different file already registered under that name")]
    FileConflict { file: String },

    /// Two definitions share a fully-qualified name.
    #[error("symbol {symbol} in {file} is already defined in {existing_file}")]
    DuplicateSymbol {
        symbol: String,
        file: String,
        existing_file: String,
    },

    /// A type reference could not be resolved from its scope.
    #[error("{symbol} in {file}: type {type_name:?} is not defined")]
    UnresolvedType {
        symbol: String,
        file: String,
        type_name: String,
    },

    /// A type reference resolved to the wrong kind of definition.
    #[error("{symbol} in {file}: {type_name} is not {expected}")]
    TypeMismatch {
        symbol: String,
        file: String,
        type_name: String,
        expected: &'static str,
    },

    /// A field declares neither a scalar type nor a type name.
    #[error("{symbol} in {file}: field has no type")]
    MissingFieldType { symbol: String, file: String },

    /// A field number is outside the valid range or reserved.
    #[error("{symbol} in {file}: invalid field number {number}")]
    InvalidFieldNumber {
        symbol: String,
        file: String,
        number: i32,
    },

    /// An extension range is empty or outside the valid field-number range.
    #[error("message {message} in {file}: invalid extension range {start}..{end}")]
    InvalidExtensionRange {
        message: String,
        file: String,
        start: i32,
        end: i32,
    },

    /// Two extension ranges of one message share a number.
    #[error("message {message} in {file}: extension ranges {first:?} and {second:?} overlap")]
    OverlappingExtensionRanges {
        message: String,
        file: String,
        first: Range<u32>,
        second: Range<u32>,
    },

    /// A regular field uses a number reserved for extensions.
    #[error("message {message}: field {field} uses number {number}, inside extension range {range:?}")]
    FieldInExtensionRange {
        message: String,
        field: String,
        number: u32,
        range: Range<u32>,
    },

    /// Two fields of one message share a number.
    #[error("message {message}: field number {number} is used more than once")]
    DuplicateFieldNumber { message: String, number: u32 },

    /// Two fields of one message share a name.
    #[error("message {message}: field name {name:?} is used more than once")]
    DuplicateFieldName { message: String, name: String },

    /// An extension was declared without naming the message it extends.
    #[error("extension {extension} in {file} has no extendee")]
    MissingExtendee { extension: String, file: String },

    /// An extension number lies outside the extendee's extension ranges.
    #[error("extension {extension}: {containing_type} does not declare {number} as an extension number")]
    ExtensionOutOfRange {
        extension: String,
        containing_type: String,
        number: u32,
    },

    /// Two extensions of the same message claim one number.
    #[error("extension {extension}: number {number} on {containing_type} is already used by {existing}")]
    ExtensionNumberConflict {
        extension: String,
        containing_type: String,
        number: u32,
        existing: String,
    },

    /// A name in the file is not a valid identifier path.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

/// Result type alias for registry operations.
pub type PoolResult<T> = Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dependency_display() {
        let err = PoolError::MissingDependency {
            file: "b.proto".to_string(),
            dependency: "a.proto".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("b.proto"));
        assert!(msg.contains("a.proto"));
    }

    #[test]
    fn not_found_display() {
        let err = PoolError::NotFound {
            kind: "message",
            name: "acme.Missing".to_string(),
        };
        assert_eq!(format!("{err}"), "message not found: acme.Missing");
    }
}
