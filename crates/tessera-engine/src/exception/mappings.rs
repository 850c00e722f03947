//! Embedder-registered converters for foreign exception types

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tessera_sdk::InteropValue;

use crate::meta::Meta;
use crate::object::GuestRef;

/// Builds a guest exception directly from a foreign exception value.
pub trait InternalTypeConverter: Send + Sync {
    /// Convert `foreign`
    fn convert(&self, meta: &Meta, foreign: &InteropValue) -> GuestRef;
}

impl<F> InternalTypeConverter for F
where
    F: Fn(&Meta, &InteropValue) -> GuestRef + Send + Sync,
{
    fn convert(&self, meta: &Meta, foreign: &InteropValue) -> GuestRef {
        self(meta, foreign)
    }
}

/// Converts a foreign exception, given as its guest carrier, into a guest
/// object; `None` if it does not apply after all.
pub trait TypeConverter: Send + Sync {
    /// Convert `carrier`
    fn convert(&self, meta: &Meta, carrier: &GuestRef) -> Option<GuestRef>;
}

impl<F> TypeConverter for F
where
    F: Fn(&Meta, &GuestRef) -> Option<GuestRef> + Send + Sync,
{
    fn convert(&self, meta: &Meta, carrier: &GuestRef) -> Option<GuestRef> {
        self(meta, carrier)
    }
}

/// Converters keyed by the qualified name foreign meta objects report.
///
/// Built once through the `with_*` methods, read-only afterwards.
#[derive(Default, Clone)]
pub struct TypeMappings {
    internal: FxHashMap<String, Arc<dyn InternalTypeConverter>>,
    general: FxHashMap<String, Arc<dyn TypeConverter>>,
}

impl TypeMappings {
    /// Empty mappings
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an internal converter for `type_name`, replacing any earlier one
    pub fn with_internal_converter(
        mut self,
        type_name: impl Into<String>,
        converter: impl InternalTypeConverter + 'static,
    ) -> Self {
        self.internal.insert(type_name.into(), Arc::new(converter));
        self
    }

    /// Register a general converter for `type_name`, replacing any earlier one
    pub fn with_converter(mut self, type_name: impl Into<String>, converter: impl TypeConverter + 'static) -> Self {
        self.general.insert(type_name.into(), Arc::new(converter));
        self
    }

    /// Internal converter for `type_name`
    pub fn internal_converter(&self, type_name: &str) -> Option<&dyn InternalTypeConverter> {
        self.internal.get(type_name).map(|c| &**c)
    }

    /// General converter for `type_name`
    pub fn converter(&self, type_name: &str) -> Option<&dyn TypeConverter> {
        self.general.get(type_name).map(|c| &**c)
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.internal.is_empty() && self.general.is_empty()
    }
}

impl fmt::Debug for TypeMappings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut internal: Vec<_> = self.internal.keys().collect();
        let mut general: Vec<_> = self.general.keys().collect();
        internal.sort();
        general.sort();
        f.debug_struct("TypeMappings")
            .field("internal", &internal)
            .field("general", &general)
            .finish()
    }
}
