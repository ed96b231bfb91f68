use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::ambient::{AmbientRuntime, SymbolSource};
use crate::library::{Library, LibraryCatalog};
use crate::symbol::{BoundaryId, Origin, Symbol};
use isoload_config::BoundaryConfig;
use isoload_core::{IsoError, LibraryTarget, Result};

#[derive(Default)]
struct SearchPath {
    order: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

/// An isolation unit resolving symbols from its own libraries first.
///
/// Created once per plugin and kept for the plugin's lifetime. The search path
/// only ever grows. All state is internally synchronised so downloads may
/// inject libraries while other threads resolve symbols.
pub struct BoundaryLoader {
    id: BoundaryId,
    parent: Arc<dyn SymbolSource>,
    catalog: Arc<dyn LibraryCatalog>,
    search_path: Mutex<SearchPath>,
    opened: DashMap<PathBuf, Option<Arc<Library>>>,
    resolved: DashMap<String, Symbol>,
    shared_prefixes: Vec<String>,
    never_local_prefixes: Vec<String>,
}

impl BoundaryLoader {
    pub fn new(parent: Arc<dyn SymbolSource>, catalog: Arc<dyn LibraryCatalog>) -> Self {
        Self {
            id: BoundaryId::next(),
            parent,
            catalog,
            search_path: Mutex::new(SearchPath::default()),
            opened: DashMap::new(),
            resolved: DashMap::new(),
            shared_prefixes: Vec::new(),
            never_local_prefixes: Vec::new(),
        }
    }

    /// A boundary delegating to the process-wide ambient runtime.
    pub fn with_ambient_parent(catalog: Arc<dyn LibraryCatalog>) -> Self {
        Self::new(AmbientRuntime::global(), catalog)
    }

    pub fn with_config(
        parent: Arc<dyn SymbolSource>,
        catalog: Arc<dyn LibraryCatalog>,
        config: &BoundaryConfig,
    ) -> Self {
        let mut loader = Self::new(parent, catalog);
        loader.shared_prefixes = config.shared_prefixes.clone();
        loader.never_local_prefixes = config.never_local_prefixes.clone();
        loader
    }

    /// Names under `prefix` are taken from the parent whenever the parent has
    /// already resolved them. Used for the loader's own scaffolding.
    pub fn share_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.shared_prefixes.push(prefix.into());
        self
    }

    /// Names under `prefix` are never resolved from this boundary's libraries.
    pub fn never_local(mut self, prefix: impl Into<String>) -> Self {
        self.never_local_prefixes.push(prefix.into());
        self
    }

    pub fn id(&self) -> BoundaryId {
        self.id
    }

    pub fn is_shared(&self, name: &str) -> bool {
        self.shared_prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }

    pub fn is_never_local(&self, name: &str) -> bool {
        self.never_local_prefixes
            .iter()
            .any(|p| name.starts_with(p.as_str()))
    }

    /// Append `location` to the search path unless an equal path is already
    /// present. Relative paths are made absolute first.
    pub fn add_library(&self, location: &Path) {
        let location = std::path::absolute(location).unwrap_or_else(|_| location.to_path_buf());
        let mut path = self.search_path.lock();
        if path.seen.insert(location.clone()) {
            debug!(boundary = %self.id, path = ?location, "library injected");
            path.order.push(location);
        } else {
            trace!(boundary = %self.id, path = ?location, "library already on search path");
        }
    }

    /// Snapshot of the search path in injection order.
    pub fn libraries(&self) -> Vec<PathBuf> {
        self.search_path.lock().order.clone()
    }

    /// A symbol already resolved through this boundary.
    pub fn loaded_symbol(&self, name: &str) -> Option<Symbol> {
        self.resolved.get(name).map(|s| s.clone())
    }

    /// Resolve `name` to a symbol, preferring this boundary's own libraries.
    ///
    /// With `link` set, every symbol the definition refers to is resolved
    /// through this boundary as well before returning.
    pub fn resolve_symbol(&self, name: &str, link: bool) -> Result<Symbol> {
        let symbol = self.resolve_unlinked(name)?;
        if link {
            for dep in symbol.def().links() {
                self.resolve_unlinked(dep)?;
            }
        }
        Ok(symbol)
    }

    fn resolve_unlinked(&self, name: &str) -> Result<Symbol> {
        if let Some(found) = self.resolved.get(name) {
            return Ok(found.clone());
        }

        if self.is_shared(name) {
            if let Some(found) = self.parent.find_loaded(name) {
                trace!(boundary = %self.id, symbol = name, "reusing parent's shared symbol");
                return Ok(self.remember(name, found));
            }
        }

        if !self.is_never_local(name) {
            if let Some(found) = self.find_local(name) {
                debug!(boundary = %self.id, symbol = name, "resolved from injected library");
                return Ok(self.remember(name, found));
            }
        }

        let found = self.parent.resolve(name).map_err(|e| match e {
            IsoError::Resolution { .. } => IsoError::Resolution {
                name: name.to_string(),
            },
            other => other,
        })?;
        trace!(boundary = %self.id, symbol = name, "delegated to parent");
        Ok(self.remember(name, found))
    }

    /// The first racing resolution wins so every caller sees the same symbol.
    fn remember(&self, name: &str, symbol: Symbol) -> Symbol {
        self.resolved
            .entry(name.to_string())
            .or_insert(symbol)
            .clone()
    }

    fn find_local(&self, name: &str) -> Option<Symbol> {
        for location in self.libraries() {
            let library = self
                .opened
                .entry(location.clone())
                .or_insert_with(|| self.catalog.open(&location))
                .clone();
            if let Some(def) = library.as_ref().and_then(|lib| lib.find(name)) {
                return Some(Symbol::define(Arc::clone(def), Origin::Boundary(self.id)));
            }
        }
        None
    }
}

impl SymbolSource for BoundaryLoader {
    fn find_loaded(&self, name: &str) -> Option<Symbol> {
        self.loaded_symbol(name)
    }

    fn resolve(&self, name: &str) -> Result<Symbol> {
        self.resolve_symbol(name, false)
    }
}

impl LibraryTarget for BoundaryLoader {
    fn add_library(&self, location: &Path) {
        BoundaryLoader::add_library(self, location)
    }
}

impl std::fmt::Debug for BoundaryLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundaryLoader")
            .field("id", &self.id)
            .field("libraries", &self.libraries())
            .field("shared_prefixes", &self.shared_prefixes)
            .field("never_local_prefixes", &self.never_local_prefixes)
            .finish()
    }
}
