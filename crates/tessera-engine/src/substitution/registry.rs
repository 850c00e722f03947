//! Substitution registry
//!
//! Two tables map a [`MethodKey`] to its [`SubstitutionFactory`]:
//!
//! - the static table, built once per process from the built-in
//!   declarations and read-only afterwards
//! - the runtime table, owned by one runtime instance, where substitutions
//!   can be added and removed concurrently
//!
//! Lookups consult the static table first. A runtime substitution for a key
//! that also has a static one is still stored, and still counts for
//! [`SubstitutionRegistry::has_substitution`], but never wins resolution.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rustc_hash::FxHashMap;

use crate::method::MethodInfo;
use crate::options::RuntimeOptions;
use crate::substitution::factory::SubstitutionFactory;
use crate::substitution::key::MethodKey;
use crate::substitution::node::DispatchNode;
use crate::symbol::Symbol;

/// Registry errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    /// Two static substitutions claim the same method. This is a build
    /// defect; the static table refuses to initialize.
    #[error("Duplicate static substitution for {0}")]
    DuplicateStaticSubstitution(MethodKey),

    /// A runtime substitution already exists and the caller asked to fail
    #[error("A runtime substitution for {0} is already registered")]
    DuplicateRuntimeSubstitution(MethodKey),
}

/// The immutable, process-wide table of static substitutions.
#[derive(Debug, Default)]
pub struct StaticTable {
    entries: FxHashMap<MethodKey, Arc<SubstitutionFactory>>,
}

impl StaticTable {
    /// An empty table
    pub fn empty() -> Self {
        Self::default()
    }

    /// The table of built-in substitutions, built on first use
    pub fn builtin() -> Arc<StaticTable> {
        crate::substitutions::builtin_table()
    }

    /// Factory registered for `key`
    #[inline]
    pub fn get(&self, key: &MethodKey) -> Option<&Arc<SubstitutionFactory>> {
        self.entries.get(key)
    }

    /// Whether `key` has a static substitution
    #[inline]
    pub fn contains(&self, key: &MethodKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All keys, in no particular order
    pub fn keys(&self) -> impl Iterator<Item = &MethodKey> {
        self.entries.keys()
    }
}

/// Populates a [`StaticTable`] exactly once.
#[derive(Debug, Default)]
pub struct StaticTableBuilder {
    entries: FxHashMap<MethodKey, Arc<SubstitutionFactory>>,
}

impl StaticTableBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under every key it targets.
    ///
    /// Fails without inserting anything if any of those keys is taken.
    pub fn register(&mut self, factory: SubstitutionFactory) -> Result<(), RegistryError> {
        let keys = factory.keys();
        if let Some(taken) = keys.iter().find(|k| self.entries.contains_key(k)) {
            return Err(RegistryError::DuplicateStaticSubstitution(*taken));
        }
        let factory = Arc::new(factory);
        for key in keys {
            tracing::trace!(%key, "static substitution registered");
            self.entries.insert(key, factory.clone());
        }
        Ok(())
    }

    /// Freeze the table
    pub fn build(self) -> StaticTable {
        StaticTable {
            entries: self.entries,
        }
    }
}

/// Per-runtime view of the static table plus the runtime table.
pub struct SubstitutionRegistry {
    static_table: Arc<StaticTable>,
    runtime: DashMap<MethodKey, Arc<SubstitutionFactory>>,
    enabled: bool,
}

impl SubstitutionRegistry {
    /// A registry over the built-in static table
    pub fn new() -> Self {
        Self::with_static_table(StaticTable::builtin())
    }

    /// A registry over a caller-supplied static table
    pub fn with_static_table(static_table: Arc<StaticTable>) -> Self {
        Self {
            static_table,
            runtime: DashMap::new(),
            enabled: true,
        }
    }

    /// A registry over the built-in static table, configured by `options`
    pub fn with_options(options: &RuntimeOptions) -> Self {
        let mut registry = Self::new();
        registry.enabled = options.substitutions_enabled;
        registry
    }

    /// Register a substitution for `owner.name signature` at run time.
    ///
    /// A key that already has a static substitution is logged as shadowed and
    /// registered anyway. If a runtime substitution exists it is replaced,
    /// unless `throw_if_present` is set.
    pub fn register_runtime(
        &self,
        owner: Symbol,
        name: Symbol,
        signature: Symbol,
        factory: SubstitutionFactory,
        throw_if_present: bool,
    ) -> Result<(), RegistryError> {
        let key = MethodKey::new(owner, name, signature);
        if self.static_table.contains(&key) {
            tracing::warn!(
                %key,
                "runtime substitution is shadowed by a static substitution and will not be used"
            );
        }

        match self.runtime.entry(key) {
            Entry::Occupied(mut entry) => {
                if throw_if_present {
                    return Err(RegistryError::DuplicateRuntimeSubstitution(key));
                }
                tracing::debug!(%key, "runtime substitution replaced");
                entry.insert(Arc::new(factory));
            }
            Entry::Vacant(entry) => {
                tracing::trace!(%key, "runtime substitution registered");
                entry.insert(Arc::new(factory));
            }
        }
        Ok(())
    }

    /// Remove the runtime substitution for `method`, if any
    pub fn remove_runtime(&self, method: &dyn MethodInfo) {
        let key = MethodKey::of(method);
        if self.runtime.remove(&key).is_some() {
            tracing::trace!(%key, "runtime substitution removed");
        }
    }

    /// A dispatch node for `method`, or `None` to run the original body
    pub fn resolve(&self, method: &dyn MethodInfo) -> Option<DispatchNode> {
        self.lookup(method, false)
    }

    /// Like [`resolve`](Self::resolve), skipping the loader check of static
    /// substitutions. For privileged internal callers only.
    pub fn resolve_forced(&self, method: &dyn MethodInfo) -> Option<DispatchNode> {
        self.lookup(method, true)
    }

    fn lookup(&self, method: &dyn MethodInfo, force_valid: bool) -> Option<DispatchNode> {
        if !self.enabled {
            return None;
        }
        let key = MethodKey::of(method);
        let factory = match self.static_table.get(&key) {
            Some(factory) => factory.clone(),
            None => self.runtime.get(&key).map(|entry| entry.value().clone())?,
        };
        factory.create_node(method, force_valid)
    }

    /// Whether either table has an entry for `method`, valid or not
    pub fn has_substitution(&self, method: &dyn MethodInfo) -> bool {
        let key = MethodKey::of(method);
        self.static_table.contains(&key) || self.runtime.contains_key(&key)
    }

    /// Number of static keys
    pub fn static_len(&self) -> usize {
        self.static_table.len()
    }

    /// Number of runtime keys
    pub fn runtime_len(&self) -> usize {
        self.runtime.len()
    }

    /// Whether resolution consults the tables at all
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for SubstitutionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SubstitutionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubstitutionRegistry")
            .field("static", &self.static_table.len())
            .field("runtime", &self.runtime.len())
            .field("enabled", &self.enabled)
            .finish()
    }
}
