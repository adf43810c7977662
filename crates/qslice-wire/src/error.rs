//! Error types for the wire codec.

use qslice_ir::{ErrorCategory, IrError};
use thiserror::Error;

/// Errors raised while encoding or decoding a program.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WireError {
    /// The bytes are not a valid protobuf message.
    #[error("Malformed message: {0}")]
    Decode(#[from] prost::DecodeError),

    /// The decoded structure violates an IR invariant.
    #[error("Invalid circuit: {0}")]
    Ir(#[from] IrError),

    /// A constant references an entry at or after its own position.
    #[error("Constant {at} references constant {index}, which is not defined before it")]
    ForwardReference {
        /// The referenced index.
        index: i32,
        /// Position of the referencing constant.
        at: usize,
    },

    /// An index points past the end of the constant table.
    #[error("Constant index {index} out of range for table with {len} entries")]
    IndexOutOfRange {
        /// The referenced index.
        index: i32,
        /// Number of constants in the table.
        len: usize,
    },

    /// A constant has a different kind than the reference expects.
    #[error("Constant {index} is not a {expected}")]
    ConstantTypeMismatch {
        /// The referenced index.
        index: i32,
        /// The kind the reference expects.
        expected: &'static str,
    },

    /// A circuit carries both inline moments and moment indices.
    #[error("Circuit mixes inline moments and moment indices")]
    MixedMomentForms,

    /// A required field is absent.
    #[error("Missing field '{0}'")]
    MissingField(&'static str),

    /// An argument does not have the shape its context requires.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Argument nesting exceeds the configured depth.
    #[error("Argument nesting exceeds the maximum depth of {max}")]
    ArgumentTooDeep {
        /// The configured ceiling.
        max: usize,
    },

    /// A gate, argument or tag kind outside the known set.
    #[error("Unsupported variant: {0}")]
    UnsupportedVariant(String),

    /// The encoded message exceeds the configured size.
    #[error("Message of {size} bytes exceeds the limit of {max} bytes")]
    MessageTooLarge {
        /// Message size in bytes.
        size: usize,
        /// The configured ceiling.
        max: usize,
    },
}

impl WireError {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            WireError::Ir(err) => err.category(),
            WireError::IndexOutOfRange { .. } | WireError::ArgumentTooDeep { .. } => {
                ErrorCategory::UnresolvedReference
            }
            WireError::UnsupportedVariant(_) => ErrorCategory::UnsupportedVariant,
            WireError::MessageTooLarge { .. } => ErrorCategory::ResourceLimit,
            WireError::Decode(_)
            | WireError::ForwardReference { .. }
            | WireError::ConstantTypeMismatch { .. }
            | WireError::MixedMomentForms
            | WireError::MissingField(_)
            | WireError::InvalidArgument(_) => ErrorCategory::StructuralViolation,
        }
    }
}

/// Result type for wire operations.
pub type WireResult<T> = Result<T, WireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WireError::ForwardReference { index: 4, at: 2 };
        assert_eq!(
            err.to_string(),
            "Constant 2 references constant 4, which is not defined before it"
        );
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            WireError::ForwardReference { index: 1, at: 1 }.category(),
            ErrorCategory::StructuralViolation
        );
        assert_eq!(
            WireError::IndexOutOfRange { index: 9, len: 2 }.category(),
            ErrorCategory::UnresolvedReference
        );
        assert_eq!(
            WireError::UnsupportedVariant("gate".into()).category(),
            ErrorCategory::UnsupportedVariant
        );
        let ir = IrError::FlattenLimitExceeded {
            limit: "depth",
            max: 3,
        };
        assert_eq!(WireError::from(ir).category(), ErrorCategory::ResourceLimit);
    }
}
