//! Small enums shared by every interop message family.

use std::fmt;

// ============================================================================
// ByteOrder
// ============================================================================

/// Byte order used by the fixed-width buffer messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Least significant byte first
    Little,
    /// Most significant byte first
    Big,
}

impl ByteOrder {
    /// Byte order of the machine running this process
    #[inline]
    pub const fn native() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        }
    }

    /// The other byte order
    #[inline]
    pub const fn swapped(self) -> Self {
        match self {
            ByteOrder::Little => ByteOrder::Big,
            ByteOrder::Big => ByteOrder::Little,
        }
    }
}

// ============================================================================
// ExceptionType
// ============================================================================

/// Category of an exception value, as reported by `get_exception_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionType {
    /// The guest program requested an exit; carries an exit status
    Exit,
    /// Execution was interrupted
    Interrupt,
    /// A regular runtime error
    RuntimeError,
    /// Source could not be parsed; may be an incomplete source
    ParseError,
}

impl ExceptionType {
    /// Upper-case constant name, matching the guest enum constants
    pub const fn constant_name(self) -> &'static str {
        match self {
            ExceptionType::Exit => "EXIT",
            ExceptionType::Interrupt => "INTERRUPT",
            ExceptionType::RuntimeError => "RUNTIME_ERROR",
            ExceptionType::ParseError => "PARSE_ERROR",
        }
    }

    /// All exception types in declaration order
    pub const ALL: [ExceptionType; 4] = [
        ExceptionType::Exit,
        ExceptionType::Interrupt,
        ExceptionType::RuntimeError,
        ExceptionType::ParseError,
    ];
}

impl fmt::Display for ExceptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.constant_name())
    }
}

// ============================================================================
// TriState
// ============================================================================

/// Three-valued answer used to negotiate identity between two objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriState {
    /// Definitely true
    True,
    /// Definitely false
    False,
    /// This side cannot decide; ask the other side
    #[default]
    Undefined,
}

impl From<bool> for TriState {
    fn from(b: bool) -> Self {
        if b {
            TriState::True
        } else {
            TriState::False
        }
    }
}
