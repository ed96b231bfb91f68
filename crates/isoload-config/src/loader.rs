use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::schema::IsoConfig;
use isoload_core::{IsoError, Result};

/// Loads and reloads the isoload configuration.
pub struct ConfigLoader {
    config: RwLock<IsoConfig>,
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Resolve the config path: explicit path > ISOLOAD_CONFIG env > ~/.isoload/isoload.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("ISOLOAD_CONFIG") {
            return PathBuf::from(p);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".isoload")
            .join("isoload.toml")
    }

    /// Load the config from disk, falling back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = Self::resolve_path(path);
        let config = if config_path.exists() {
            info!(?config_path, "loading configuration");
            Self::read(&config_path)?
        } else {
            warn!(?config_path, "config file not found, using defaults");
            IsoConfig::default()
        };

        let config = Self::apply_env_overrides(config);

        match config.validate() {
            Ok(warnings) => {
                for w in &warnings {
                    warn!("{}", w);
                }
            }
            Err(e) => return Err(IsoError::Config(e)),
        }

        Ok(Self {
            config: RwLock::new(config),
            config_path,
        })
    }

    fn read(path: &Path) -> Result<IsoConfig> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str::<IsoConfig>(&raw)
            .map_err(|e| IsoError::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Get a read snapshot of the current config.
    pub fn get(&self) -> IsoConfig {
        self.config.read().clone()
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Apply env var overrides (ISOLOAD_CACHE_DIR, ISOLOAD_DEFAULT_REPOSITORY, ISOLOAD_LOG_LEVEL).
    fn apply_env_overrides(mut config: IsoConfig) -> IsoConfig {
        if let Ok(v) = std::env::var("ISOLOAD_CACHE_DIR") {
            config.resolver.cache_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("ISOLOAD_DEFAULT_REPOSITORY") {
            config.resolver.default_repository = v;
        }
        if let Ok(v) = std::env::var("ISOLOAD_LOG_LEVEL") {
            config.logging.level = v;
        }
        config
    }

    /// Reload the config from disk.
    pub fn reload(&self) -> Result<()> {
        if !self.config_path.exists() {
            return Err(IsoError::Config(format!(
                "config file not found: {}",
                self.config_path.display()
            )));
        }
        let new_config = Self::apply_env_overrides(Self::read(&self.config_path)?);
        new_config.validate().map_err(IsoError::Config)?;
        *self.config.write() = new_config;
        info!("configuration reloaded");
        Ok(())
    }
}
