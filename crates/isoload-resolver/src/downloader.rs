use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::engine::{ExclusionSet, ResolutionEngine, ResolveRequest};
use crate::list::DependencyList;
use crate::remote::RemoteEngine;
use isoload_config::ResolverConfig;
use isoload_core::{DependencyCoordinate, IsoError, LibraryTarget, Repository, Result};

/// Downloads dependencies into a cache directory and injects them into a
/// library target, usually a boundary loader.
pub struct DependencyDownloader {
    target: Arc<dyn LibraryTarget>,
    cache_dir: PathBuf,
    default_repository: Repository,
    extra_repositories: Vec<Repository>,
    engine: Arc<dyn ResolutionEngine>,
}

impl DependencyDownloader {
    pub fn new(
        target: Arc<dyn LibraryTarget>,
        cache_dir: impl Into<PathBuf>,
        engine: Arc<dyn ResolutionEngine>,
    ) -> Self {
        Self {
            target,
            cache_dir: cache_dir.into(),
            default_repository: Repository::maven_central(),
            extra_repositories: Vec::new(),
            engine,
        }
    }

    /// A downloader fetching over HTTP with the repositories and cache
    /// directory from `config`.
    pub fn from_config(target: Arc<dyn LibraryTarget>, config: &ResolverConfig) -> Result<Self> {
        let engine = Arc::new(RemoteEngine::http(&config.user_agent)?);
        let mut downloader = Self::new(target, config.cache_dir.clone(), engine)
            .with_default_repository(config.default_repository());
        downloader.extra_repositories = config.extra_repositories();
        Ok(downloader)
    }

    pub fn with_default_repository(mut self, repository: Repository) -> Self {
        self.default_repository = repository;
        self
    }

    pub fn with_repository(mut self, repository: Repository) -> Self {
        self.extra_repositories.push(repository);
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// The default repository, configured extras, then every repository the
    /// coordinates declare. Duplicates keep their first position.
    pub fn repositories_for(&self, coordinates: &[DependencyCoordinate]) -> Vec<Repository> {
        let mut out: Vec<Repository> = Vec::new();
        let candidates = std::iter::once(&self.default_repository)
            .chain(&self.extra_repositories)
            .chain(coordinates.iter().map(DependencyCoordinate::repository));
        for repository in candidates {
            if !out.contains(repository) {
                out.push(repository.clone());
            }
        }
        out
    }

    /// Download, verify and inject `coordinates` with their transitive
    /// dependencies. Returns the injected files.
    ///
    /// Nothing is injected unless every download succeeded. Downloads
    /// already running when a failure is seen are not cancelled and may
    /// still complete into the cache.
    pub async fn resolve(&self, coordinates: &[DependencyCoordinate]) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;

        let request = ResolveRequest {
            coordinates: coordinates.to_vec(),
            repositories: self.repositories_for(coordinates),
            exclusions: ExclusionSet::union(coordinates),
            cache_dir: self.cache_dir.clone(),
        };
        info!(
            count = coordinates.len(),
            cache_dir = ?self.cache_dir,
            "resolving dependencies"
        );

        let mut pending: FuturesUnordered<_> = self.engine.resolve(&request).into_iter().collect();
        let mut files: Vec<PathBuf> = Vec::new();
        while let Some(outcome) = pending.next().await {
            for outcome in outcome.into_flat() {
                if let Some(cause) = outcome.error {
                    let id = outcome.coordinate.display_id();
                    error!(coordinate = %id, error = %cause, "dependency download failed");
                    return Err(IsoError::download(id, &self.cache_dir, cause));
                }
                for file in outcome.files {
                    if !files.contains(&file) {
                        files.push(file);
                    }
                }
            }
        }

        for file in &files {
            self.target.add_library(file);
        }
        debug!(injected = files.len(), "dependencies injected");
        Ok(files)
    }

    /// Resolve the coordinates of `list` whose conditions hold right now.
    pub async fn resolve_list(&self, list: &DependencyList) -> Result<Vec<PathBuf>> {
        self.resolve(&list.generate_list()).await
    }
}
