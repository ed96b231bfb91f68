use std::sync::Arc;

use isoload_boundary::{AmbientRuntime, SymbolSource};
use isoload_core::DependencyCoordinate;

/// A condition evaluated when the list is generated, not when it is built.
pub type Condition = Arc<dyn Fn(&DependencyCoordinate) -> bool + Send + Sync>;

struct ConditionalEntry {
    coordinate: DependencyCoordinate,
    condition: Condition,
}

/// Met exactly when `name` cannot be resolved by the source, which is the
/// process-wide ambient runtime unless another one is given.
#[derive(Clone)]
pub struct ClassMissingCondition {
    name: String,
    source: Arc<dyn SymbolSource>,
}

impl ClassMissingCondition {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_source(name, AmbientRuntime::global())
    }

    pub fn with_source(name: impl Into<String>, source: Arc<dyn SymbolSource>) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_met(&self) -> bool {
        self.source.resolve(&self.name).is_err()
    }
}

/// Dependencies paired with the conditions under which they are needed.
///
/// Entries are independent and keep insertion order: adding the same
/// coordinate twice yields two entries, each tested on its own condition.
/// Coordinates are compared by full value, digests included, so a
/// `derive()`d variant with different hashes is a different entry.
#[derive(Default)]
pub struct DependencyList {
    entries: Vec<ConditionalEntry>,
    denied: Vec<DependencyCoordinate>,
}

impl DependencyList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Coordinates whose condition holds right now, in insertion order.
    pub fn generate_list(&self) -> Vec<DependencyCoordinate> {
        self.entries
            .iter()
            .filter(|e| !self.is_denied(&e.coordinate))
            .filter(|e| (e.condition)(&e.coordinate))
            .map(|e| e.coordinate.clone())
            .collect()
    }

    pub fn add(&mut self, coordinate: DependencyCoordinate) -> &mut Self {
        self.add_entry(coordinate, Arc::new(|_: &DependencyCoordinate| true))
    }

    /// Add with a condition that does not look at the coordinate.
    pub fn add_when<F>(&mut self, coordinate: DependencyCoordinate, condition: F) -> &mut Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.add_entry(coordinate, Arc::new(move |_: &DependencyCoordinate| condition()))
    }

    /// Add with a condition over the coordinate itself.
    pub fn add_if<F>(&mut self, coordinate: DependencyCoordinate, condition: F) -> &mut Self
    where
        F: Fn(&DependencyCoordinate) -> bool + Send + Sync + 'static,
    {
        self.add_entry(coordinate, Arc::new(condition))
    }

    /// Add only for as long as `symbol` is not available in the ambient runtime.
    pub fn add_if_symbol_missing(
        &mut self,
        coordinate: DependencyCoordinate,
        symbol: impl Into<String>,
    ) -> &mut Self {
        self.add_if_missing(coordinate, ClassMissingCondition::new(symbol))
    }

    pub fn add_if_missing(
        &mut self,
        coordinate: DependencyCoordinate,
        condition: ClassMissingCondition,
    ) -> &mut Self {
        self.add_entry(
            coordinate,
            Arc::new(move |_: &DependencyCoordinate| condition.is_met()),
        )
    }

    /// Drop every entry equal to `coordinate` and lift a [`deny`](Self::deny)
    /// on it. The coordinate may be added again later.
    pub fn remove(&mut self, coordinate: &DependencyCoordinate) -> &mut Self {
        self.entries.retain(|e| e.coordinate != *coordinate);
        self.denied.retain(|d| d != coordinate);
        self
    }

    /// Keep `coordinate` out of generated lists, for entries added before and
    /// after this call, until it is [`remove`](Self::remove)d.
    pub fn deny(&mut self, coordinate: DependencyCoordinate) -> &mut Self {
        if !self.is_denied(&coordinate) {
            self.denied.push(coordinate);
        }
        self
    }

    pub fn is_denied(&self, coordinate: &DependencyCoordinate) -> bool {
        self.denied.contains(coordinate)
    }

    fn add_entry(&mut self, coordinate: DependencyCoordinate, condition: Condition) -> &mut Self {
        self.entries.push(ConditionalEntry {
            coordinate,
            condition,
        });
        self
    }
}

impl std::fmt::Debug for DependencyList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.coordinate.display_id()))
            .finish()
    }
}
