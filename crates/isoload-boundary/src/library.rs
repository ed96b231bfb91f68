use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::symbol::TypeDef;

/// The type definitions exported by one library file.
#[derive(Debug)]
pub struct Library {
    name: String,
    types: HashMap<String, Arc<TypeDef>>,
}

impl Library {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: HashMap::new(),
        }
    }

    pub fn with_type(mut self, def: Arc<TypeDef>) -> Self {
        self.types.insert(def.name().to_string(), def);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn find(&self, symbol: &str) -> Option<&Arc<TypeDef>> {
        self.types.get(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

/// Maps a library location on the search path to the definitions it exports.
///
/// Returning `None` means the location exports nothing this process knows
/// how to link; it stays on the search path regardless.
pub trait LibraryCatalog: Send + Sync {
    fn open(&self, location: &Path) -> Option<Arc<Library>>;
}

/// Explicit registry of libraries keyed by file name, populated when the host
/// registers the implementations it links in.
#[derive(Default)]
pub struct StaticCatalog {
    libraries: RwLock<HashMap<String, Arc<Library>>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `library` as the contents of any location named `file_name`.
    pub fn register(&self, file_name: impl Into<String>, library: Library) {
        self.libraries
            .write()
            .insert(file_name.into(), Arc::new(library));
    }

    pub fn len(&self) -> usize {
        self.libraries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.read().is_empty()
    }
}

impl LibraryCatalog for StaticCatalog {
    fn open(&self, location: &Path) -> Option<Arc<Library>> {
        let file_name = location.file_name()?.to_str()?;
        self.libraries.read().get(file_name).cloned()
    }
}
