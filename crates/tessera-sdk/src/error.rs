//! Error types for the interop protocol

use crate::value::InteropValue;

/// Result type for interop messages
pub type InteropResult<T> = Result<T, InteropError>;

/// The closed set of conditions an interop message reports.
///
/// Each variant carries exactly what is needed to rebuild the matching
/// guest exception. The optional `cause` is an exception value from the
/// system that produced the failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InteropException {
    /// The receiver does not support this message
    #[error("Unsupported message")]
    UnsupportedMessage {
        /// Originating exception, if any
        cause: Option<InteropValue>,
    },

    /// A member name could not be resolved
    #[error("Unknown identifier: {id}")]
    UnknownIdentifier {
        /// The member name that was not found
        id: String,
        /// Originating exception, if any
        cause: Option<InteropValue>,
    },

    /// An executable was called with the wrong number of arguments.
    /// `max` is `-1` for variadic executables.
    #[error("Arity error - expected: {min}-{max} actual: {actual}")]
    Arity {
        /// Minimum accepted arguments
        min: i32,
        /// Maximum accepted arguments, or -1 if unbounded
        max: i32,
        /// Number of arguments supplied
        actual: i32,
        /// Originating exception, if any
        cause: Option<InteropValue>,
    },

    /// One of the supplied values has a type the receiver rejects
    #[error("Unsupported type: {hint}")]
    UnsupportedType {
        /// The values supplied to the failing message
        supplied_values: Vec<InteropValue>,
        /// Human-readable explanation
        hint: String,
        /// Originating exception, if any
        cause: Option<InteropValue>,
    },

    /// An array index is out of range or otherwise not accessible
    #[error("Invalid array index {index}")]
    InvalidArrayIndex {
        /// The rejected index
        index: i64,
        /// Originating exception, if any
        cause: Option<InteropValue>,
    },

    /// A buffer access falls outside the buffer
    #[error("Invalid buffer access of length {length} at byte offset {offset}")]
    InvalidBufferOffset {
        /// Byte offset of the access
        offset: i64,
        /// Width of the access in bytes
        length: i64,
        /// Originating exception, if any
        cause: Option<InteropValue>,
    },

    /// An iterator has no more elements
    #[error("Stop iteration")]
    StopIteration {
        /// Originating exception, if any
        cause: Option<InteropValue>,
    },

    /// A hash key is not mapped (or cannot be written or removed)
    #[error("Unknown key: {key:?}")]
    UnknownKey {
        /// The rejected key
        key: InteropValue,
        /// Originating exception, if any
        cause: Option<InteropValue>,
    },
}

impl InteropException {
    /// `UnsupportedMessage` without a cause
    #[inline]
    pub fn unsupported() -> Self {
        InteropException::UnsupportedMessage { cause: None }
    }

    /// `UnknownIdentifier` without a cause
    pub fn unknown_identifier(id: impl Into<String>) -> Self {
        InteropException::UnknownIdentifier {
            id: id.into(),
            cause: None,
        }
    }

    /// `Arity` without a cause
    pub fn arity(min: i32, max: i32, actual: i32) -> Self {
        InteropException::Arity {
            min,
            max,
            actual,
            cause: None,
        }
    }

    /// `UnsupportedType` without a cause
    pub fn unsupported_type(supplied_values: Vec<InteropValue>, hint: impl Into<String>) -> Self {
        InteropException::UnsupportedType {
            supplied_values,
            hint: hint.into(),
            cause: None,
        }
    }

    /// `InvalidArrayIndex` without a cause
    pub fn invalid_index(index: i64) -> Self {
        InteropException::InvalidArrayIndex { index, cause: None }
    }

    /// `InvalidBufferOffset` without a cause
    pub fn invalid_offset(offset: i64, length: i64) -> Self {
        InteropException::InvalidBufferOffset {
            offset,
            length,
            cause: None,
        }
    }

    /// `StopIteration` without a cause
    #[inline]
    pub fn stop_iteration() -> Self {
        InteropException::StopIteration { cause: None }
    }

    /// `UnknownKey` without a cause
    pub fn unknown_key(key: InteropValue) -> Self {
        InteropException::UnknownKey { key, cause: None }
    }

    /// Attach a cause, replacing any previous one
    pub fn with_cause(mut self, new_cause: InteropValue) -> Self {
        *self.cause_slot() = Some(new_cause);
        self
    }

    /// The originating exception, if any
    pub fn cause(&self) -> Option<&InteropValue> {
        match self {
            InteropException::UnsupportedMessage { cause }
            | InteropException::UnknownIdentifier { cause, .. }
            | InteropException::Arity { cause, .. }
            | InteropException::UnsupportedType { cause, .. }
            | InteropException::InvalidArrayIndex { cause, .. }
            | InteropException::InvalidBufferOffset { cause, .. }
            | InteropException::StopIteration { cause }
            | InteropException::UnknownKey { cause, .. } => cause.as_ref(),
        }
    }

    fn cause_slot(&mut self) -> &mut Option<InteropValue> {
        match self {
            InteropException::UnsupportedMessage { cause }
            | InteropException::UnknownIdentifier { cause, .. }
            | InteropException::Arity { cause, .. }
            | InteropException::UnsupportedType { cause, .. }
            | InteropException::InvalidArrayIndex { cause, .. }
            | InteropException::InvalidBufferOffset { cause, .. }
            | InteropException::StopIteration { cause }
            | InteropException::UnknownKey { cause, .. } => cause,
        }
    }

    /// Stable kind name, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            InteropException::UnsupportedMessage { .. } => "UnsupportedMessage",
            InteropException::UnknownIdentifier { .. } => "UnknownIdentifier",
            InteropException::Arity { .. } => "Arity",
            InteropException::UnsupportedType { .. } => "UnsupportedType",
            InteropException::InvalidArrayIndex { .. } => "InvalidArrayIndex",
            InteropException::InvalidBufferOffset { .. } => "InvalidBufferOffset",
            InteropException::StopIteration { .. } => "StopIteration",
            InteropException::UnknownKey { .. } => "UnknownKey",
        }
    }
}

/// Everything an interop message can fail with.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InteropError {
    /// One of the modeled interop conditions
    #[error(transparent)]
    Interop(#[from] InteropException),

    /// An exception value thrown by the receiver's own runtime (for example
    /// from inside `execute`). It is not one of the modeled conditions and
    /// propagates as-is.
    #[error("Exception thrown across the interop boundary: {0:?}")]
    Thrown(InteropValue),
}

impl InteropError {
    /// Shorthand for `UnsupportedMessage` without a cause
    #[inline]
    pub fn unsupported() -> Self {
        InteropError::Interop(InteropException::unsupported())
    }

    /// The modeled interop exception, if this is one
    pub fn as_interop(&self) -> Option<&InteropException> {
        match self {
            InteropError::Interop(e) => Some(e),
            InteropError::Thrown(_) => None,
        }
    }

    /// Whether this is an `UnsupportedMessage`
    pub fn is_unsupported(&self) -> bool {
        matches!(self, InteropError::Interop(InteropException::UnsupportedMessage { .. }))
    }
}
