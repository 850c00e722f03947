//! Method metadata consumed by the substitution registry
//!
//! The registry never loads classes or parses signatures itself. It asks the
//! method resolution service a handful of read-only questions through
//! [`MethodInfo`]. [`MethodDescriptor`] is a plain implementation for
//! embedders that already have the answers at hand.

use std::fmt;

use crate::defaults::{DEFAULT_RUNTIME_VERSION, MIN_RUNTIME_VERSION};
use crate::symbol::Symbol;

/// The class loader that defined a method's declaring type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefiningLoader {
    /// The boot loader (a null loader reference in the guest)
    Boot,
    /// The platform loader
    Platform,
    /// Any other loader, identified by its class name
    User(Symbol),
}

impl DefiningLoader {
    /// Whether static substitutions may be applied to types from this loader
    #[inline]
    pub fn is_trusted(&self) -> bool {
        matches!(self, DefiningLoader::Boot | DefiningLoader::Platform)
    }
}

impl fmt::Display for DefiningLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefiningLoader::Boot => f.write_str("boot"),
            DefiningLoader::Platform => f.write_str("platform"),
            DefiningLoader::User(name) => write!(f, "{}", name),
        }
    }
}

/// Inclusive range of runtime versions a substitution applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    low: u32,
    high: u32,
}

impl VersionRange {
    /// Every version
    pub const ALL: VersionRange = VersionRange {
        low: MIN_RUNTIME_VERSION,
        high: u32::MAX,
    };

    /// Versions `low..=high`
    pub const fn between(low: u32, high: u32) -> Self {
        VersionRange { low, high }
    }

    /// Versions `low` and later
    pub const fn at_least(low: u32) -> Self {
        VersionRange { low, high: u32::MAX }
    }

    /// Versions up to and including `high`
    pub const fn up_to(high: u32) -> Self {
        VersionRange {
            low: MIN_RUNTIME_VERSION,
            high,
        }
    }

    /// Whether `version` is in range
    #[inline]
    pub fn contains(&self, version: u32) -> bool {
        self.low <= version && version <= self.high
    }
}

impl Default for VersionRange {
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.high == u32::MAX {
            write!(f, "{}+", self.low)
        } else {
            write!(f, "{}-{}", self.low, self.high)
        }
    }
}

/// Read-only metadata about a concrete method.
pub trait MethodInfo {
    /// Internal name of the declaring type, e.g. `java/lang/System`
    fn declaring_type(&self) -> Symbol;

    /// Method name
    fn name(&self) -> Symbol;

    /// Raw descriptor, e.g. `(Ljava/lang/Object;I)V`
    fn signature(&self) -> Symbol;

    /// Version of the runtime the method was loaded into
    fn runtime_version(&self) -> u32;

    /// Loader that defined the declaring type
    fn defining_loader(&self) -> DefiningLoader;
}

/// A method described by plain values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    declaring_type: Symbol,
    name: Symbol,
    signature: Symbol,
    runtime_version: u32,
    loader: DefiningLoader,
}

impl MethodDescriptor {
    /// A boot-loader method at the default runtime version
    pub fn new(declaring_type: &str, name: &str, signature: &str) -> Self {
        Self {
            declaring_type: Symbol::intern(declaring_type),
            name: Symbol::intern(name),
            signature: Symbol::intern(signature),
            runtime_version: DEFAULT_RUNTIME_VERSION,
            loader: DefiningLoader::Boot,
        }
    }

    /// Set the defining loader
    pub fn with_loader(mut self, loader: DefiningLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Set the runtime version
    pub fn with_runtime_version(mut self, version: u32) -> Self {
        self.runtime_version = version;
        self
    }
}

impl MethodInfo for MethodDescriptor {
    fn declaring_type(&self) -> Symbol {
        self.declaring_type
    }

    fn name(&self) -> Symbol {
        self.name
    }

    fn signature(&self) -> Symbol {
        self.signature
    }

    fn runtime_version(&self) -> u32 {
        self.runtime_version
    }

    fn defining_loader(&self) -> DefiningLoader {
        self.loader
    }
}
