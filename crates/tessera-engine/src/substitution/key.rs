//! MethodKey - the identity substitutions are indexed by

use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::method::MethodInfo;
use crate::symbol::Symbol;

/// Composite (owner type, method name, signature) identity.
///
/// Immutable once built. Equality compares the three symbols; the hash is
/// computed once at construction. No ordering is defined.
#[derive(Clone, Copy)]
pub struct MethodKey {
    owner: Symbol,
    name: Symbol,
    signature: Symbol,
    hash: u64,
}

impl MethodKey {
    /// Build a key from interned components
    pub fn new(owner: Symbol, name: Symbol, signature: Symbol) -> Self {
        let mut hasher = FxHasher::default();
        owner.hash(&mut hasher);
        name.hash(&mut hasher);
        signature.hash(&mut hasher);
        Self {
            owner,
            name,
            signature,
            hash: hasher.finish(),
        }
    }

    /// Build a key from strings, interning each component
    pub fn from_strs(owner: &str, name: &str, signature: &str) -> Self {
        Self::new(Symbol::intern(owner), Symbol::intern(name), Symbol::intern(signature))
    }

    /// The key of a concrete method
    pub fn of(method: &dyn MethodInfo) -> Self {
        Self::new(method.declaring_type(), method.name(), method.signature())
    }

    /// Owning type
    #[inline]
    pub fn owner(&self) -> Symbol {
        self.owner
    }

    /// Method name
    #[inline]
    pub fn name(&self) -> Symbol {
        self.name
    }

    /// Raw signature
    #[inline]
    pub fn signature(&self) -> Symbol {
        self.signature
    }
}

impl PartialEq for MethodKey {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.name == other.name && self.signature == other.signature
    }
}

impl Eq for MethodKey {}

impl Hash for MethodKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.owner, self.name, self.signature)
    }
}

impl fmt::Debug for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodKey({})", self)
    }
}

/// Build a raw signature from parameter and return type descriptors.
///
/// `signature_of(&["Ljava/lang/Object;", "I"], "V")` is `(Ljava/lang/Object;I)V`.
pub fn signature_of<S: AsRef<str>>(parameters: &[S], return_type: &str) -> Symbol {
    let mut sig = String::with_capacity(2 + return_type.len() + parameters.len() * 8);
    sig.push('(');
    for p in parameters {
        sig.push_str(p.as_ref());
    }
    sig.push(')');
    sig.push_str(return_type);
    Symbol::intern(&sig)
}
