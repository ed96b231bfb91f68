use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use tracing::{debug, trace};

use isoload_core::{DependencyCoordinate, IsoError, Repository, Result};

/// Retrieves raw artifact bytes from a repository.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// `Ok(None)` when the repository does not have the artifact.
    async fn fetch(
        &self,
        repository: &Repository,
        coordinate: &DependencyCoordinate,
    ) -> Result<Option<Bytes>>;
}

/// Fetches over HTTP(S), or from disk for `file://` repositories.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| IsoError::Config(format!("failed to build http client: {e}")))?;
        Ok(Self { client })
    }

    async fn fetch_local(url: &url::Url) -> Result<Option<Bytes>> {
        let path = url.to_file_path().map_err(|_| IsoError::Fetch {
            url: url.to_string(),
            reason: "not a local path".into(),
        })?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ArtifactFetcher for HttpFetcher {
    async fn fetch(
        &self,
        repository: &Repository,
        coordinate: &DependencyCoordinate,
    ) -> Result<Option<Bytes>> {
        let url = repository.resolve(&coordinate.relative_url())?;
        if url.scheme() == "file" {
            return Self::fetch_local(&url).await;
        }

        debug!(url = %url, "fetching artifact");
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| IsoError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if resp.status() == StatusCode::NOT_FOUND {
            trace!(url = %url, "not in repository");
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(IsoError::Fetch {
                url: url.to_string(),
                reason: format!("repository returned HTTP {}", resp.status()),
            });
        }

        let bytes = resp.bytes().await.map_err(|e| IsoError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(bytes))
    }
}
