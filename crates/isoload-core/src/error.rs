use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for boundary resolution, bootstrap, and downloading.
#[derive(Error, Debug)]
pub enum IsoError {
    // ── Boundary errors ────────────────────────────────────────
    #[error("symbol could not be resolved: {name}")]
    Resolution { name: String },

    // ── Bootstrap errors ───────────────────────────────────────
    #[error("constructing {type_name} failed: {cause}")]
    Construction {
        type_name: String,
        cause: ConstructionCause,
    },

    #[error("constructing {type_name} raised an error: {source}")]
    Invocation {
        type_name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("the loaded instance is of type \"{actual}\" and does not satisfy the required capability \"{required}\"")]
    TypeMismatch { actual: String, required: String },

    #[error("calling {method} on {owner} failed: {reason}")]
    MethodDispatch {
        method: String,
        owner: String,
        reason: String,
    },

    // ── Download errors ────────────────────────────────────────
    #[error("checksum mismatch for {artifact}: {algorithm} expected {expected}, got {actual}")]
    ChecksumMismatch {
        artifact: String,
        algorithm: &'static str,
        expected: String,
        actual: String,
    },

    #[error("artifact {artifact} not found in any repository ({repositories})")]
    ArtifactNotFound {
        artifact: String,
        repositories: String,
    },

    #[error("fetching {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error(
        "downloading the dependency {coordinate} failed: {source}\n\
         If you see this error for the first time delete the \"{}\" folder and retry.\n\
         If this error persists report it to the plugin support.",
        .cache_dir.display()
    )]
    DependencyDownload {
        coordinate: String,
        cache_dir: PathBuf,
        #[source]
        source: Box<IsoError>,
    },

    #[error("invalid coordinate {coordinate}: {reason}")]
    InvalidCoordinate { coordinate: String, reason: String },

    // ── Config errors ──────────────────────────────────────────
    #[error("config error: {0}")]
    Config(String),

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Why a constructor could not be selected or bound.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructionCause {
    #[error("arity mismatch: no constructor takes {wanted} parameters (available: {available:?})")]
    ArityMismatch { wanted: usize, available: Vec<usize> },

    #[error("argument type mismatch at position {index}: expected {expected}")]
    ArgumentTypeMismatch { index: usize, expected: String },

    #[error("binding failed: {0}")]
    Binding(String),
}

impl IsoError {
    /// Wraps a download-phase failure with the coordinate and the cache
    /// directory the remediation hint points at.
    pub fn download(coordinate: impl Into<String>, cache_dir: &std::path::Path, source: IsoError) -> Self {
        let cache_dir = std::path::absolute(cache_dir).unwrap_or_else(|_| cache_dir.to_path_buf());
        IsoError::DependencyDownload {
            coordinate: coordinate.into(),
            cache_dir,
            source: Box::new(source),
        }
    }

    pub fn dispatch(method: &str, owner: &str, reason: impl Into<String>) -> Self {
        IsoError::MethodDispatch {
            method: method.to_string(),
            owner: owner.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IsoError>;
