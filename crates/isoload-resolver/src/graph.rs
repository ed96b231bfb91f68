use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use isoload_core::{DependencyCoordinate, IsoError, Repository, Result};

/// Answers "what does this artifact depend on".
#[async_trait]
pub trait DependencyGraph: Send + Sync {
    async fn dependencies(
        &self,
        coordinate: &DependencyCoordinate,
        repositories: &[Repository],
    ) -> Result<Vec<DependencyCoordinate>>;
}

/// A graph in which nothing has dependencies.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDependencies;

#[async_trait]
impl DependencyGraph for NoDependencies {
    async fn dependencies(
        &self,
        _coordinate: &DependencyCoordinate,
        _repositories: &[Repository],
    ) -> Result<Vec<DependencyCoordinate>> {
        Ok(Vec::new())
    }
}

/// A fixed graph keyed by `group:artifact:version[:classifier]`.
///
/// ```toml
/// [[dependencies."org.spongepowered:configurate-hocon:3.6.1"]]
/// group_id = "com.typesafe"
/// artifact_id = "config"
/// version = "1.3.1"
/// md5 = "..."
/// sha1 = "..."
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticGraph {
    #[serde(default)]
    dependencies: HashMap<String, Vec<DependencyCoordinate>>,
}

impl StaticGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| IsoError::Config(format!("invalid dependency graph: {e}")))
    }

    pub fn with_edge(mut self, parent: &DependencyCoordinate, child: DependencyCoordinate) -> Self {
        self.dependencies
            .entry(parent.display_id())
            .or_default()
            .push(child);
        self
    }

    pub fn children(&self, parent: &DependencyCoordinate) -> &[DependencyCoordinate] {
        self.dependencies
            .get(&parent.display_id())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[async_trait]
impl DependencyGraph for StaticGraph {
    async fn dependencies(
        &self,
        coordinate: &DependencyCoordinate,
        _repositories: &[Repository],
    ) -> Result<Vec<DependencyCoordinate>> {
        Ok(self.children(coordinate).to_vec())
    }
}
