//! Dispatch nodes produced by substitution factories

use std::fmt;
use std::sync::Arc;

use crate::context::InteropContext;
use crate::exception::Thrown;
use crate::object::GuestValue;
use crate::substitution::key::MethodKey;

/// Body of a substitution.
///
/// Receives the runtime context and the guest arguments (receiver first for
/// instance methods) and returns the guest result, `GuestValue::Void` for
/// `V` methods.
pub type SubstitutionFn =
    Arc<dyn Fn(&InteropContext, &[GuestValue]) -> Result<GuestValue, Thrown> + Send + Sync>;

/// A callable replacement for an interpreted method body.
///
/// Installing the node in place of the method is the caller's job; the
/// registry only produces it.
#[derive(Clone)]
pub struct DispatchNode {
    key: MethodKey,
    body: SubstitutionFn,
}

impl DispatchNode {
    pub(crate) fn new(key: MethodKey, body: SubstitutionFn) -> Self {
        Self { key, body }
    }

    /// Key of the method this node replaces
    #[inline]
    pub fn key(&self) -> MethodKey {
        self.key
    }

    /// Run the substitution
    #[inline]
    pub fn call(&self, ctx: &InteropContext, args: &[GuestValue]) -> Result<GuestValue, Thrown> {
        (self.body)(ctx, args)
    }
}

impl fmt::Debug for DispatchNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchNode").field("key", &self.key).finish()
    }
}
