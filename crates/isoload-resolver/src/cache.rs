use bytes::Bytes;
use md5::Md5;
use sha1::{Digest, Sha1};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use isoload_core::{DependencyCoordinate, IsoError, Result};

/// Lowercase hex MD5 and SHA-1 of a byte string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digests {
    pub md5: String,
    pub sha1: String,
}

impl Digests {
    pub fn of(data: &[u8]) -> Self {
        Self {
            md5: hex::encode(Md5::digest(data)),
            sha1: hex::encode(Sha1::digest(data)),
        }
    }
}

/// Accept `data` only if both digests match.
pub fn verify_bytes(artifact: &str, data: &[u8], md5: &str, sha1: &str) -> Result<()> {
    let actual = Digests::of(data);
    if !actual.md5.eq_ignore_ascii_case(md5) {
        return Err(IsoError::ChecksumMismatch {
            artifact: artifact.to_string(),
            algorithm: "MD5",
            expected: md5.to_string(),
            actual: actual.md5,
        });
    }
    if !actual.sha1.eq_ignore_ascii_case(sha1) {
        return Err(IsoError::ChecksumMismatch {
            artifact: artifact.to_string(),
            algorithm: "SHA-1",
            expected: sha1.to_string(),
            actual: actual.sha1,
        });
    }
    Ok(())
}

pub fn verify_file(path: &Path, md5: &str, sha1: &str) -> Result<()> {
    let data = std::fs::read(path)?;
    verify_bytes(&path.display().to_string(), &data, md5, sha1)
}

/// Verified artifacts on disk, laid out like a Maven repository.
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    root: PathBuf,
}

impl ArtifactCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, coordinate: &DependencyCoordinate) -> PathBuf {
        self.root.join(coordinate.relative_path())
    }

    /// The cached file for `coordinate` if it exists and matches both
    /// digests. A file that does not match is treated as absent.
    pub fn lookup(&self, coordinate: &DependencyCoordinate) -> Result<Option<PathBuf>> {
        let path = self.path_for(coordinate);
        if !path.is_file() {
            return Ok(None);
        }
        match verify_file(&path, coordinate.md5(), coordinate.sha1()) {
            Ok(()) => Ok(Some(path)),
            Err(IsoError::ChecksumMismatch { algorithm, .. }) => {
                warn!(coordinate = %coordinate, path = ?path, algorithm, "cached artifact does not match, refetching");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Write `data` to the cache path of `coordinate`. The file appears
    /// under its final name only once fully written.
    pub fn store(&self, coordinate: &DependencyCoordinate, data: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(coordinate);
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(data)?;
        tmp.flush()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(coordinate = %coordinate, path = ?path, bytes = data.len(), "artifact stored");
        Ok(path)
    }

    /// [`lookup`](Self::lookup) on the blocking pool.
    pub async fn find(&self, coordinate: &DependencyCoordinate) -> Result<Option<PathBuf>> {
        let (cache, coordinate) = (self.clone(), coordinate.clone());
        blocking(move || cache.lookup(&coordinate)).await
    }

    /// Check both digests of `data`, then [`store`](Self::store) it. Hashing
    /// and writing run on the blocking pool.
    pub async fn verify_and_store(
        &self,
        coordinate: &DependencyCoordinate,
        data: Bytes,
    ) -> Result<PathBuf> {
        let (cache, coordinate) = (self.clone(), coordinate.clone());
        blocking(move || {
            verify_bytes(&coordinate.display_id(), &data, coordinate.md5(), coordinate.sha1())?;
            cache.store(&coordinate, &data)
        })
        .await
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| IsoError::Other(anyhow::anyhow!("cache task failed: {e}")))?
}
