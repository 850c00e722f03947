//! Built-in static substitutions
//!
//! The static table is declared here once and built on first use. Each
//! submodule registers the substitutions of one guest class.

mod interop;
mod system;

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::substitution::{RegistryError, StaticTable, StaticTableBuilder};

static BUILTIN: Lazy<Arc<StaticTable>> = Lazy::new(|| match build() {
    Ok(table) => Arc::new(table),
    // Two declarations claiming one key is a build defect
    Err(e) => panic!("static substitution table is inconsistent: {}", e),
});

/// The process-wide table of built-in substitutions
pub fn builtin_table() -> Arc<StaticTable> {
    BUILTIN.clone()
}

fn build() -> Result<StaticTable, RegistryError> {
    let mut builder = StaticTableBuilder::new();
    system::register(&mut builder)?;
    interop::register(&mut builder)?;
    let table = builder.build();
    tracing::debug!(entries = table.len(), "static substitution table built");
    Ok(table)
}
