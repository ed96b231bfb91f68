use isoload_core::Repository;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration, read from `isoload.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IsoConfig {
    pub resolver: ResolverConfig,
    pub boundary: BoundaryConfig,
    pub logging: LoggingConfig,
}

// ── Resolver ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Where downloaded artifacts are cached, in repository layout.
    pub cache_dir: PathBuf,
    /// Always consulted first, whether or not a coordinate names it.
    pub default_repository: String,
    /// Extra repositories appended after the default one.
    pub repositories: Vec<String>,
    /// User-Agent sent with every artifact request.
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_dir: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".isoload")
                .join("libs"),
            default_repository: Repository::MAVEN_CENTRAL_URL.into(),
            repositories: Vec::new(),
            user_agent: concat!("isoload/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl ResolverConfig {
    pub fn default_repository(&self) -> Repository {
        Repository::new(self.default_repository.clone())
    }

    pub fn extra_repositories(&self) -> Vec<Repository> {
        self.repositories.iter().cloned().map(Repository::new).collect()
    }
}

// ── Boundary ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    /// Namespaces reused from the parent when the parent already resolved them
    /// (the loader's own scaffolding).
    pub shared_prefixes: Vec<String>,
    /// Namespaces that are never resolved locally (public API types).
    pub never_local_prefixes: Vec<String>,
}

// ── Logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Output format: "pretty", "json", "compact".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

// ── Validation ─────────────────────────────────────────────────

/// A single config validation issue.
#[derive(Debug)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
    pub severity: WarningSeverity,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.severity {
            WarningSeverity::Error => "error",
            WarningSeverity::Warning => "warning",
            WarningSeverity::Info => "info",
        };
        write!(f, "{}: {}: {}", label, self.field, self.message)?;
        if let Some(ref h) = self.hint {
            write!(f, " ({})", h)?;
        }
        Ok(())
    }
}

impl IsoConfig {
    /// Check the config for problems. Returns the non-fatal warnings, or an
    /// error string if any issue has `Error` severity.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, String> {
        let warnings = self.collect_warnings();
        let errors: Vec<String> = warnings
            .iter()
            .filter(|w| w.severity == WarningSeverity::Error)
            .map(|w| w.to_string())
            .collect();
        if !errors.is_empty() {
            return Err(errors.join("; "));
        }
        Ok(warnings)
    }

    pub fn collect_warnings(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        // ── Repositories ───
        let repos = std::iter::once(&self.resolver.default_repository)
            .chain(self.resolver.repositories.iter());
        for (i, url) in repos.enumerate() {
            let field = if i == 0 {
                "resolver.default_repository".to_string()
            } else {
                format!("resolver.repositories[{}]", i - 1)
            };
            if !(url.starts_with("https://") || url.starts_with("http://") || url.starts_with("file://")) {
                warnings.push(ConfigWarning {
                    field,
                    message: format!("'{}' is not an http(s) or file url", url),
                    severity: WarningSeverity::Error,
                    hint: Some(format!("e.g. {}", Repository::MAVEN_CENTRAL_URL)),
                });
            } else if url.starts_with("http://") {
                warnings.push(ConfigWarning {
                    field,
                    message: format!("'{}' is fetched over plain http", url),
                    severity: WarningSeverity::Warning,
                    hint: Some("checksums still apply, but prefer https".into()),
                });
            }
        }

        if self.resolver.cache_dir.as_os_str().is_empty() {
            warnings.push(ConfigWarning {
                field: "resolver.cache_dir".into(),
                message: "cache directory is empty".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. '~/.isoload/libs'".into()),
            });
        }

        // ── Boundary prefixes ───
        for p in &self.boundary.never_local_prefixes {
            if p.is_empty() {
                warnings.push(ConfigWarning {
                    field: "boundary.never_local_prefixes".into(),
                    message: "empty prefix would delegate every symbol to the parent".into(),
                    severity: WarningSeverity::Error,
                    hint: None,
                });
            }
        }

        // ── Logging ───
        let valid_formats = ["pretty", "json", "compact"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.format".into(),
                message: format!("unknown log format '{}'", self.logging.format),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_formats.join(", "))),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.level".into(),
                message: format!("unknown log level '{}'", self.logging.level),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_levels.join(", "))),
            });
        }

        warnings
    }
}
