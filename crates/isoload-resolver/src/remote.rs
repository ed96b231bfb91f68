use futures::FutureExt;
use futures::future::BoxFuture;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use crate::cache::ArtifactCache;
use crate::engine::{DownloadOutcome, ExclusionSet, PendingOutcome, ResolutionEngine, ResolveRequest};
use crate::fetch::{ArtifactFetcher, HttpFetcher};
use crate::graph::{DependencyGraph, NoDependencies};
use isoload_core::{ArtifactIdentity, DependencyCoordinate, IsoError, Repository, Result};

/// Downloads from remote repositories into the cache, one tokio task per
/// root coordinate.
pub struct RemoteEngine {
    fetcher: Arc<dyn ArtifactFetcher>,
    graph: Arc<dyn DependencyGraph>,
}

impl RemoteEngine {
    pub fn new(fetcher: Arc<dyn ArtifactFetcher>, graph: Arc<dyn DependencyGraph>) -> Self {
        Self { fetcher, graph }
    }

    /// HTTP fetching without transitive discovery.
    pub fn http(user_agent: &str) -> Result<Self> {
        Ok(Self::new(
            Arc::new(HttpFetcher::new(user_agent)?),
            Arc::new(NoDependencies),
        ))
    }
}

impl ResolutionEngine for RemoteEngine {
    fn resolve(&self, request: &ResolveRequest) -> Vec<PendingOutcome> {
        let job = Arc::new(Job {
            fetcher: Arc::clone(&self.fetcher),
            graph: Arc::clone(&self.graph),
            repositories: request.repositories.clone(),
            exclusions: request.exclusions.clone(),
            cache: ArtifactCache::new(&request.cache_dir),
        });

        request
            .coordinates
            .iter()
            .cloned()
            .map(|root| {
                let job = Arc::clone(&job);
                let coordinate = root.clone();
                let handle = tokio::spawn(async move {
                    let mut visited = HashSet::from([root.identity()]);
                    let follow = root.is_transitive();
                    job.walk(root, follow, &mut visited).await
                });
                async move {
                    match handle.await {
                        Ok(outcome) => outcome,
                        Err(e) => DownloadOutcome::failed(
                            coordinate,
                            IsoError::Other(anyhow::anyhow!("download task failed: {e}")),
                        ),
                    }
                }
                .boxed()
            })
            .collect()
    }
}

struct Job {
    fetcher: Arc<dyn ArtifactFetcher>,
    graph: Arc<dyn DependencyGraph>,
    repositories: Vec<Repository>,
    exclusions: ExclusionSet,
    cache: ArtifactCache,
}

impl Job {
    fn walk<'a>(
        &'a self,
        coordinate: DependencyCoordinate,
        follow: bool,
        visited: &'a mut HashSet<ArtifactIdentity>,
    ) -> BoxFuture<'a, DownloadOutcome> {
        async move {
            let file = match self.fetch_verified(&coordinate).await {
                Ok(file) => file,
                Err(e) => {
                    warn!(coordinate = %coordinate, error = %e, "download failed");
                    return DownloadOutcome::failed(coordinate, e);
                }
            };

            let mut transitive = Vec::new();
            if follow {
                let children = match self
                    .graph
                    .dependencies(&coordinate, &self.repositories)
                    .await
                {
                    Ok(children) => children,
                    Err(e) => return DownloadOutcome::failed(coordinate, e),
                };
                for child in children {
                    if self.exclusions.excludes(&child) {
                        debug!(parent = %coordinate, excluded = %child, "skipping excluded dependency");
                        continue;
                    }
                    if !visited.insert(child.identity()) {
                        continue;
                    }
                    transitive.push(self.walk(child, true, visited).await);
                }
            }

            DownloadOutcome::succeeded(coordinate, vec![file], transitive)
        }
        .boxed()
    }

    async fn fetch_verified(&self, coordinate: &DependencyCoordinate) -> Result<PathBuf> {
        coordinate.validate()?;
        if let Some(path) = self.cache.find(coordinate).await? {
            trace!(coordinate = %coordinate, "already cached");
            return Ok(path);
        }

        for repository in &self.repositories {
            let Some(data) = self.fetcher.fetch(repository, coordinate).await? else {
                trace!(coordinate = %coordinate, repository = %repository, "not in repository");
                continue;
            };
            let path = self.cache.verify_and_store(coordinate, data).await?;
            info!(coordinate = %coordinate, repository = %repository, "downloaded");
            return Ok(path);
        }

        Err(IsoError::ArtifactNotFound {
            artifact: coordinate.display_id(),
            repositories: self
                .repositories
                .iter()
                .map(Repository::url)
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}
