use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::debug;

use crate::symbol::{Origin, Symbol, TypeDef};
use isoload_core::{IsoError, Result};

/// Something a boundary can delegate to.
pub trait SymbolSource: Send + Sync {
    /// A symbol this source has already resolved, without resolving anything new.
    fn find_loaded(&self, name: &str) -> Option<Symbol>;

    /// Resolve `name`, failing with `IsoError::Resolution` if it is unknown.
    fn resolve(&self, name: &str) -> Result<Symbol>;
}

static GLOBAL: Lazy<Arc<AmbientRuntime>> = Lazy::new(|| Arc::new(AmbientRuntime::new()));

/// The process-wide root of every delegation chain: types the host itself
/// provides, outside any boundary.
#[derive(Default)]
pub struct AmbientRuntime {
    symbols: DashMap<String, Symbol>,
}

impl AmbientRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared runtime of this process.
    pub fn global() -> Arc<AmbientRuntime> {
        Arc::clone(&GLOBAL)
    }

    /// Make `def` available to every boundary delegating here. Registering a
    /// name twice keeps the first definition.
    pub fn register(&self, def: Arc<TypeDef>) -> Symbol {
        let name = def.name().to_string();
        self.symbols
            .entry(name.clone())
            .or_insert_with(|| {
                debug!(symbol = %name, "registered ambient symbol");
                Symbol::define(def, Origin::Ambient)
            })
            .clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }
}

impl SymbolSource for AmbientRuntime {
    fn find_loaded(&self, name: &str) -> Option<Symbol> {
        self.symbols.get(name).map(|s| s.clone())
    }

    fn resolve(&self, name: &str) -> Result<Symbol> {
        self.find_loaded(name).ok_or_else(|| IsoError::Resolution {
            name: name.to_string(),
        })
    }
}
