//! Method substitution: keys, factories, dispatch nodes and the registry

pub mod factory;
pub mod key;
pub mod node;
pub mod registry;

pub use factory::{SubstitutionBuilder, SubstitutionFactory, SubstitutionKind};
pub use key::{signature_of, MethodKey};
pub use node::{DispatchNode, SubstitutionFn};
pub use registry::{RegistryError, StaticTable, StaticTableBuilder, SubstitutionRegistry};
