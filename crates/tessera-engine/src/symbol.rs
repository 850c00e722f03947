//! Process-wide symbol interning
//!
//! Type names, method names and signatures are interned once and referred
//! to by small `Copy` symbols, so that method keys compare and hash in O(1).
//! The interner is shared by every runtime in the process; interned strings
//! are never freed.

use std::fmt;
use std::num::NonZeroU32;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// An interned string symbol (32-bit index).
///
/// Symbols are small (4 bytes) and can be copied cheaply.
/// Use [`Symbol::as_str`] to get the actual string.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(NonZeroU32);

impl Symbol {
    #[inline]
    fn from_raw(raw: u32) -> Self {
        // NonZeroU32 cannot be 0, so index 0 is stored as 1
        Symbol(NonZeroU32::MIN.saturating_add(raw))
    }

    #[inline]
    fn to_raw(self) -> usize {
        (self.0.get() - 1) as usize
    }

    /// Intern a string, returning its symbol.
    pub fn intern(s: &str) -> Symbol {
        if let Some(&sym) = INTERNER.read().map.get(s) {
            return sym;
        }
        INTERNER.write().intern(s)
    }

    /// Resolve the symbol back to its string.
    pub fn as_str(self) -> &'static str {
        INTERNER.read().resolve(self)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::intern(s)
    }
}

static INTERNER: Lazy<RwLock<Interner>> = Lazy::new(|| RwLock::new(Interner::new()));

/// String interner that deduplicates strings.
struct Interner {
    /// Map from string to symbol index
    map: FxHashMap<&'static str, Symbol>,

    /// Interned strings, indexed by symbol
    strings: Vec<&'static str>,
}

impl Interner {
    fn new() -> Self {
        Self {
            map: FxHashMap::default(),
            strings: Vec::new(),
        }
    }

    fn intern(&mut self, s: &str) -> Symbol {
        // Another thread may have interned it between the read and write lock
        if let Some(&sym) = self.map.get(s) {
            return sym;
        }

        let sym = Symbol::from_raw(self.strings.len() as u32);
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        self.strings.push(leaked);
        self.map.insert(leaked, sym);
        sym
    }

    #[inline]
    fn resolve(&self, sym: Symbol) -> &'static str {
        self.strings.get(sym.to_raw()).copied().unwrap_or("")
    }
}
