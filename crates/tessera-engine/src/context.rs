//! Per-runtime interop context
//!
//! Bundles what one runtime instance needs to resolve substitutions and to
//! run them: its options, the guest object factory, the substitution
//! registry (the process-wide static table plus this runtime's own runtime
//! table) and the exception bridge. Substitution bodies receive it as their
//! first argument.

use std::sync::Arc;

use tessera_sdk::InteropValue;

use crate::exception::ExceptionBridge;
use crate::meta::{GuestHeap, Meta, NativeHeap};
use crate::method::MethodDescriptor;
use crate::method::MethodInfo;
use crate::object::{wrap_result, GuestRef};
use crate::options::RuntimeOptions;
use crate::substitution::{DispatchNode, SubstitutionRegistry};

/// Interop state of one runtime instance.
#[derive(Debug)]
pub struct InteropContext {
    options: RuntimeOptions,
    meta: Arc<Meta>,
    registry: SubstitutionRegistry,
    bridge: ExceptionBridge,
}

impl InteropContext {
    /// A context with default options on a [`NativeHeap`]
    pub fn new() -> Self {
        Self::with_options(RuntimeOptions::default())
    }

    /// A context on a [`NativeHeap`]
    pub fn with_options(options: RuntimeOptions) -> Self {
        Self::with_heap(options, Arc::new(NativeHeap::new()))
    }

    /// A context allocating through the embedder's heap
    pub fn with_heap(options: RuntimeOptions, heap: Arc<dyn GuestHeap>) -> Self {
        let meta = Arc::new(Meta::new(heap));
        let registry = SubstitutionRegistry::with_options(&options);
        let bridge = ExceptionBridge::new(meta.clone(), options.type_mappings.clone());
        Self {
            options,
            meta,
            registry,
            bridge,
        }
    }

    /// Options this context was created with
    #[inline]
    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// Guest object factory
    #[inline]
    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// Substitution registry
    #[inline]
    pub fn registry(&self) -> &SubstitutionRegistry {
        &self.registry
    }

    /// Exception bridge
    #[inline]
    pub fn bridge(&self) -> &ExceptionBridge {
        &self.bridge
    }

    /// A dispatch node for `method`, or `None` to run the original body
    pub fn resolve(&self, method: &dyn MethodInfo) -> Option<DispatchNode> {
        self.registry.resolve(method)
    }

    /// Resolve without the loader check of static substitutions
    pub fn resolve_forced(&self, method: &dyn MethodInfo) -> Option<DispatchNode> {
        self.registry.resolve_forced(method)
    }

    /// Whether any substitution is registered for `method`
    pub fn has_substitution(&self, method: &dyn MethodInfo) -> bool {
        self.registry.has_substitution(method)
    }

    /// A boot-loader method loaded into this runtime's version
    pub fn describe_method(&self, declaring_type: &str, name: &str, signature: &str) -> MethodDescriptor {
        MethodDescriptor::new(declaring_type, name, signature).with_runtime_version(self.options.runtime_version)
    }

    /// The guest reference for an interop result
    #[inline]
    pub fn wrap_result(&self, value: InteropValue) -> GuestRef {
        wrap_result(self.meta.heap(), value)
    }
}

impl Default for InteropContext {
    fn default() -> Self {
        Self::new()
    }
}
