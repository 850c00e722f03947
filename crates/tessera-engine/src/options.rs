//! Runtime options

use std::sync::Arc;

use crate::defaults::{DEFAULT_RUNTIME_VERSION, DEFAULT_SUBSTITUTIONS_ENABLED};
use crate::exception::TypeMappings;

/// Options for creating an [`InteropContext`](crate::context::InteropContext)
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Consult substitutions at all. When off, every method runs its
    /// original body.
    pub substitutions_enabled: bool,

    /// Version stamped on methods described through the context
    pub runtime_version: u32,

    /// Converters for foreign exceptions, keyed by foreign type name
    pub type_mappings: Arc<TypeMappings>,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            substitutions_enabled: DEFAULT_SUBSTITUTIONS_ENABLED,
            runtime_version: DEFAULT_RUNTIME_VERSION,
            type_mappings: Arc::new(TypeMappings::default()),
        }
    }
}
