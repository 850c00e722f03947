//! Substitution factories
//!
//! A factory describes one substitution: which methods it targets, the
//! runtime versions it applies to, and the body to dispatch to. It produces
//! a [`DispatchNode`] for a concrete method only after checking that the
//! method really is the one the substitution was written for.

use std::fmt;
use std::sync::Arc;

use crate::context::InteropContext;
use crate::exception::Thrown;
use crate::method::{MethodInfo, VersionRange};
use crate::object::GuestValue;
use crate::substitution::key::{signature_of, MethodKey};
use crate::substitution::node::{DispatchNode, SubstitutionFn};
use crate::symbol::Symbol;

/// How a factory was registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstitutionKind {
    /// Built into the process-wide static table. Hard-codes assumptions
    /// about well-known types, so it only applies to trusted loaders.
    Static,
    /// Registered at run time (for example by an instrumentation agent)
    Runtime,
}

/// Lazy producer of dispatch nodes for one substitution.
pub struct SubstitutionFactory {
    target_class_names: Vec<Symbol>,
    target_method_names: Vec<Symbol>,
    parameter_types: Vec<Symbol>,
    return_type: Symbol,
    has_receiver: bool,
    versions: VersionRange,
    kind: SubstitutionKind,
    body: SubstitutionFn,
}

impl SubstitutionFactory {
    /// Start describing a static substitution of `class_name.method_name`
    pub fn builder(class_name: &str, method_name: &str) -> SubstitutionBuilder {
        SubstitutionBuilder {
            target_class_names: vec![Symbol::intern(class_name)],
            target_method_names: vec![Symbol::intern(method_name)],
            parameter_types: Vec::new(),
            return_type: Symbol::intern("V"),
            has_receiver: false,
            versions: VersionRange::ALL,
        }
    }

    /// A runtime substitution. Its key is supplied when it is registered.
    pub fn runtime<F>(body: F) -> Self
    where
        F: Fn(&InteropContext, &[GuestValue]) -> Result<GuestValue, Thrown> + Send + Sync + 'static,
    {
        Self {
            target_class_names: Vec::new(),
            target_method_names: Vec::new(),
            parameter_types: Vec::new(),
            return_type: Symbol::intern("V"),
            has_receiver: false,
            versions: VersionRange::ALL,
            kind: SubstitutionKind::Runtime,
            body: Arc::new(body),
        }
    }

    /// Restrict a runtime substitution to a version range
    pub fn with_versions(mut self, versions: VersionRange) -> Self {
        self.versions = versions;
        self
    }

    /// Registration kind
    #[inline]
    pub fn kind(&self) -> SubstitutionKind {
        self.kind
    }

    /// Applicable runtime versions
    #[inline]
    pub fn versions(&self) -> VersionRange {
        self.versions
    }

    /// Whether the first declared parameter is the receiver
    #[inline]
    pub fn has_receiver(&self) -> bool {
        self.has_receiver
    }

    /// The raw signature of the substituted method, without the receiver
    pub fn signature(&self) -> Symbol {
        let skip = usize::from(self.has_receiver);
        let params: Vec<&str> = self.parameter_types[skip.min(self.parameter_types.len())..]
            .iter()
            .map(|s| s.as_str())
            .collect();
        signature_of(&params, self.return_type.as_str())
    }

    /// One key per (target class, target method name) pair
    pub fn keys(&self) -> Vec<MethodKey> {
        let signature = self.signature();
        let mut keys = Vec::with_capacity(self.target_class_names.len() * self.target_method_names.len());
        for &class in &self.target_class_names {
            for &name in &self.target_method_names {
                keys.push(MethodKey::new(class, name, signature));
            }
        }
        keys
    }

    /// Whether this substitution applies to `method`.
    ///
    /// Declines if the method's runtime version is out of range, or if this is
    /// a static substitution and the declaring type was not defined by the
    /// boot or platform loader. `force_valid` skips the loader check.
    pub fn is_valid_for(&self, method: &dyn MethodInfo, force_valid: bool) -> bool {
        let version = method.runtime_version();
        if !self.versions.contains(version) {
            tracing::debug!(
                method = %MethodKey::of(method),
                versions = %self.versions,
                version,
                "substitution declined: runtime version out of range"
            );
            return false;
        }

        if self.kind == SubstitutionKind::Static && !force_valid {
            let loader = method.defining_loader();
            if !loader.is_trusted() {
                tracing::debug!(
                    method = %MethodKey::of(method),
                    expected = "boot or platform",
                    actual = %loader,
                    "static substitution declined: unexpected defining loader"
                );
                return false;
            }
        }

        true
    }

    /// A dispatch node for `method`, or `None` if the substitution declines
    pub fn create_node(&self, method: &dyn MethodInfo, force_valid: bool) -> Option<DispatchNode> {
        if self.is_valid_for(method, force_valid) {
            Some(DispatchNode::new(MethodKey::of(method), self.body.clone()))
        } else {
            None
        }
    }
}

impl fmt::Debug for SubstitutionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubstitutionFactory")
            .field("kind", &self.kind)
            .field("classes", &self.target_class_names)
            .field("methods", &self.target_method_names)
            .field("signature", &self.signature())
            .field("versions", &self.versions)
            .finish()
    }
}

/// Builder for static substitution factories.
pub struct SubstitutionBuilder {
    target_class_names: Vec<Symbol>,
    target_method_names: Vec<Symbol>,
    parameter_types: Vec<Symbol>,
    return_type: Symbol,
    has_receiver: bool,
    versions: VersionRange,
}

impl SubstitutionBuilder {
    /// Also target `class_name`, for substitutions shared by several types
    pub fn also_class(mut self, class_name: &str) -> Self {
        self.target_class_names.push(Symbol::intern(class_name));
        self
    }

    /// Also target `method_name`, for substitutions covering several names
    pub fn also_method(mut self, method_name: &str) -> Self {
        self.target_method_names.push(Symbol::intern(method_name));
        self
    }

    /// Declare an instance method; the receiver takes the first argument slot
    /// and is not part of the signature
    pub fn receiver(mut self, type_descriptor: &str) -> Self {
        if !self.has_receiver {
            self.parameter_types.insert(0, Symbol::intern(type_descriptor));
            self.has_receiver = true;
        }
        self
    }

    /// Declared parameter type descriptors, excluding the receiver
    pub fn parameters(mut self, descriptors: &[&str]) -> Self {
        self.parameter_types.extend(descriptors.iter().map(|d| Symbol::intern(d)));
        self
    }

    /// Return type descriptor
    pub fn returns(mut self, descriptor: &str) -> Self {
        self.return_type = Symbol::intern(descriptor);
        self
    }

    /// Applicable runtime versions
    pub fn versions(mut self, versions: VersionRange) -> Self {
        self.versions = versions;
        self
    }

    /// Finish with the substitution body
    pub fn body<F>(self, body: F) -> SubstitutionFactory
    where
        F: Fn(&InteropContext, &[GuestValue]) -> Result<GuestValue, Thrown> + Send + Sync + 'static,
    {
        self.body_fn(Arc::new(body))
    }

    /// Finish with a shared substitution body
    pub fn body_fn(self, body: SubstitutionFn) -> SubstitutionFactory {
        SubstitutionFactory {
            target_class_names: self.target_class_names,
            target_method_names: self.target_method_names,
            parameter_types: self.parameter_types,
            return_type: self.return_type,
            has_receiver: self.has_receiver,
            versions: self.versions,
            kind: SubstitutionKind::Static,
            body,
        }
    }
}
