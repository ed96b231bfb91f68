use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use isoload_boundary::{BoundaryLoader, StaticCatalog};
use isoload_config::IsoConfig;
use isoload_core::{DependencyCoordinate, IsoError, Result};
use isoload_resolver::{
    DependencyDownloader, DependencyGraph, HttpFetcher, NoDependencies, RemoteEngine, StaticGraph,
};

/// A dependency manifest.
///
/// ```toml
/// [[dependency]]
/// group_id = "org.spongepowered"
/// artifact_id = "configurate-hocon"
/// version = "3.6.1"
/// md5 = "6395403afce7b9bbf4e26ef74c13da9a"
/// sha1 = "e3f199dbd91de753a70f63606f530fdb8644bbd5"
/// repository = "https://repo.spongepowered.org/maven"
/// transitive = true
/// exclusions = ["com.google.code.findbugs:jsr305"]
///
/// [[graph.dependencies."org.spongepowered:configurate-hocon:3.6.1"]]
/// group_id = "com.typesafe"
/// # ...
/// ```
#[derive(Debug, Default, Deserialize)]
pub(super) struct Manifest {
    #[serde(default, rename = "dependency")]
    pub dependencies: Vec<DependencyCoordinate>,
    #[serde(default)]
    pub graph: Option<StaticGraph>,
}

impl Manifest {
    pub fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| IsoError::Config(format!("invalid manifest: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }
}

pub(super) async fn cmd_fetch(
    config: IsoConfig,
    manifest: &Path,
    cache_dir: Option<PathBuf>,
) -> Result<()> {
    let manifest = Manifest::load(manifest)?;
    if manifest.dependencies.is_empty() {
        println!("No dependencies in manifest.");
        return Ok(());
    }

    let cache_dir = cache_dir.unwrap_or_else(|| config.resolver.cache_dir.clone());
    let graph: Arc<dyn DependencyGraph> = match manifest.graph {
        Some(graph) => Arc::new(graph),
        None => Arc::new(NoDependencies),
    };
    let fetcher = Arc::new(HttpFetcher::new(&config.resolver.user_agent)?);
    let engine = Arc::new(RemoteEngine::new(fetcher, graph));

    let loader = Arc::new(BoundaryLoader::with_config(
        isoload_boundary::AmbientRuntime::global(),
        Arc::new(StaticCatalog::new()),
        &config.boundary,
    ));

    let mut downloader = DependencyDownloader::new(loader.clone(), &cache_dir, engine)
        .with_default_repository(config.resolver.default_repository());
    for repository in config.resolver.extra_repositories() {
        downloader = downloader.with_repository(repository);
    }

    info!(count = manifest.dependencies.len(), cache_dir = ?cache_dir, "fetching manifest");
    downloader.resolve(&manifest.dependencies).await?;

    for path in loader.libraries() {
        println!("{}", path.display());
    }
    println!("✅ {} libraries ready", loader.libraries().len());
    Ok(())
}
