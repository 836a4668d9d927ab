//! Configuration system.
//!
//! Settings come from an optional TOML file layered under environment
//! variables. A variable such as `COUNTER__SERVER__ADDR` overrides the `addr`
//! key of the `[server]` section.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::core::error::Result;

/// Prefix of environment variables that override file settings.
pub const ENV_PREFIX: &str = "COUNTER";

/// Environment variable naming an alternative configuration file.
pub const CONFIG_PATH_ENV: &str = "COUNTER_CONFIG";

/// Default configuration file, read when present.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

// ============================================================================
// Configurable Trait
// ============================================================================

/// Trait for types that can be loaded from configuration
///
/// # Example
///
/// ```ignore
/// use serde::Deserialize;
/// use counter_signals::core::config::Configurable;
///
/// #[derive(Debug, Deserialize, Default)]
/// #[serde(default)]
/// pub struct BannerConfig {
///     pub text: String,
/// }
///
/// impl Configurable for BannerConfig {
///     const PREFIX: &'static str = "banner";
/// }
/// ```
pub trait Configurable: DeserializeOwned + Default {
    /// Configuration section prefix (corresponds to TOML section name)
    const PREFIX: &'static str;
}

// ============================================================================
// Configuration Store
// ============================================================================

/// Layered configuration storage
pub struct ConfigStore {
    inner: Config,
    path: Option<PathBuf>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::empty()
    }
}

impl ConfigStore {
    /// Create an empty configuration store
    pub fn empty() -> Self {
        Self {
            inner: Config::default(),
            path: None,
        }
    }

    /// Create a configuration store from a TOML string, without environment overrides
    pub fn parse(content: &str) -> Result<Self> {
        let inner = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;
        Ok(Self { inner, path: None })
    }

    /// Load the process configuration.
    ///
    /// The file named by `COUNTER_CONFIG` is required when that variable is
    /// set; otherwise `config.toml` is read if it exists.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(PathBuf::from(path), true),
            None => Self::from_file(DEFAULT_CONFIG_PATH, false),
        }
    }

    /// Create a configuration store from a file plus environment overrides
    pub fn from_file(path: impl AsRef<Path>, required: bool) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let inner = Self::build(path, required, env_source())?;
        Ok(Self {
            inner,
            path: Some(path.to_path_buf()),
        })
    }

    fn build(path: &Path, required: bool, env: Environment) -> Result<Config> {
        let config = Config::builder()
            .add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(required),
            )
            .add_source(env)
            .build()?;
        Ok(config)
    }

    /// Get a typed configuration section
    ///
    /// If the section doesn't exist, returns the default value.
    pub fn get<C: Configurable>(&self) -> Result<C> {
        debug!("Loading config section: {}", C::PREFIX);

        match self.inner.get::<C>(C::PREFIX) {
            Ok(section) => Ok(section),
            Err(ConfigError::NotFound(_)) => Ok(C::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Get the configuration file path (if loaded from file)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}
