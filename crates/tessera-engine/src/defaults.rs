//! Default constants for runtime configuration.

/// Runtime version reported for methods when the embedder does not supply one.
pub const DEFAULT_RUNTIME_VERSION: u32 = 21;

/// Oldest runtime version a substitution can target.
pub const MIN_RUNTIME_VERSION: u32 = 8;

/// Substitutions are consulted unless the embedder disables them.
pub const DEFAULT_SUBSTITUTIONS_ENABLED: bool = true;
