use futures::future::BoxFuture;
use std::path::PathBuf;

use isoload_core::{DependencyCoordinate, ExclusionPattern, IsoError, Repository};

/// The union of every exclusion declared by the requested coordinates.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    patterns: Vec<ExclusionPattern>,
}

impl ExclusionSet {
    pub fn new(patterns: Vec<ExclusionPattern>) -> Self {
        Self { patterns }
    }

    pub fn union<'a>(coordinates: impl IntoIterator<Item = &'a DependencyCoordinate>) -> Self {
        let mut patterns: Vec<ExclusionPattern> = Vec::new();
        for pattern in coordinates.into_iter().flat_map(|c| c.exclusions()) {
            if !patterns.contains(pattern) {
                patterns.push(pattern.clone());
            }
        }
        Self { patterns }
    }

    pub fn patterns(&self) -> &[ExclusionPattern] {
        &self.patterns
    }

    pub fn excludes(&self, coordinate: &DependencyCoordinate) -> bool {
        self.patterns.iter().any(|p| p.matches_coordinate(coordinate))
    }
}

/// Everything an engine needs for one resolve call.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub coordinates: Vec<DependencyCoordinate>,
    pub repositories: Vec<Repository>,
    pub exclusions: ExclusionSet,
    pub cache_dir: PathBuf,
}

/// Result of downloading one coordinate, with the results of its transitive
/// dependencies nested below it.
#[derive(Debug)]
pub struct DownloadOutcome {
    pub coordinate: DependencyCoordinate,
    pub files: Vec<PathBuf>,
    pub transitive: Vec<DownloadOutcome>,
    pub error: Option<IsoError>,
}

impl DownloadOutcome {
    pub fn succeeded(
        coordinate: DependencyCoordinate,
        files: Vec<PathBuf>,
        transitive: Vec<DownloadOutcome>,
    ) -> Self {
        Self {
            coordinate,
            files,
            transitive,
            error: None,
        }
    }

    pub fn failed(coordinate: DependencyCoordinate, error: IsoError) -> Self {
        Self {
            coordinate,
            files: Vec::new(),
            transitive: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// This outcome followed by its transitive outcomes, depth first.
    pub fn into_flat(self) -> Vec<DownloadOutcome> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(mut self, out: &mut Vec<DownloadOutcome>) {
        let children = std::mem::take(&mut self.transitive);
        out.push(self);
        for child in children {
            child.flatten_into(out);
        }
    }
}

/// Pending result for one root coordinate.
pub type PendingOutcome = BoxFuture<'static, DownloadOutcome>;

/// Turns coordinates into files on disk.
///
/// Implementations start work for every root coordinate as soon as
/// [`resolve`](Self::resolve) is called; dropping a returned future does not
/// stop that work.
pub trait ResolutionEngine: Send + Sync {
    fn resolve(&self, request: &ResolveRequest) -> Vec<PendingOutcome>;
}
