//! Layered application configuration.
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. A TOML file: `--config PATH`, or `config.toml` in the platform config
//!    directory if it exists
//! 3. `PROVIEW_*` environment variables, nested keys split on `__`
//!    (`PROVIEW_SEARCH__MAX_MATCHES=50`)
//! 4. Command-line flags ([`Overrides`])
//!
//! ```toml
//! workers = 4
//!
//! [search]
//! max_matches = 200
//! max_dirs = 2000
//! skip_hidden = false
//!
//! [duplicates]
//! min_size = 1024
//! chunk_size = 8192
//!
//! [delete]
//! permanent = false
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::delete::DeleteConfig;
use crate::duplicates::FinderConfig;
use crate::search::SearchConfig;

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "PROVIEW_";

/// Errors from loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// A source could not be parsed or had the wrong shape.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// The config could not be rendered as TOML.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The config file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Invalid(Box::new(err))
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Worker threads for background tasks (0 = one per CPU).
    pub workers: usize,
    /// File-name search limits.
    pub search: SearchConfig,
    /// Duplicate finder settings.
    pub duplicates: FinderConfig,
    /// Duplicate deletion settings.
    pub delete: DeleteConfig,
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub workers: Option<usize>,
    pub max_matches: Option<usize>,
    pub min_size: Option<u64>,
    pub skip_hidden: Option<bool>,
    pub permanent: Option<bool>,
}

impl Overrides {
    fn apply(&self, mut figment: Figment) -> Figment {
        if let Some(workers) = self.workers {
            figment = figment.merge(Serialized::default("workers", workers));
        }
        if let Some(max) = self.max_matches {
            figment = figment.merge(Serialized::default("search.max_matches", max));
        }
        if let Some(min_size) = self.min_size {
            figment = figment.merge(Serialized::default("duplicates.min_size", min_size));
        }
        if let Some(skip) = self.skip_hidden {
            figment = figment
                .merge(Serialized::default("search.skip_hidden", skip))
                .merge(Serialized::default("duplicates.skip_hidden", skip));
        }
        if let Some(permanent) = self.permanent {
            figment = figment.merge(Serialized::default("delete.permanent", permanent));
        }
        figment
    }
}

impl Config {
    /// Default config file location, e.g. `~/.config/proview/config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "proview", "proview").map(|d| d.config_dir().join("config.toml"))
    }

    /// Defaults plus the TOML file, without environment or CLI layers.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        Ok(Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .extract()?)
    }

    /// Load every layer.
    ///
    /// `explicit` is the `--config` path; it must exist. Without it the
    /// default path is used if present.
    ///
    /// # Errors
    ///
    /// Returns an error if `explicit` is missing or any layer is invalid.
    pub fn load(explicit: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let file = match explicit {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        };

        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = &file {
            log::debug!("Loading config from {}", file.display());
            figment = figment.merge(Toml::file(file));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        figment = overrides.apply(figment);

        let config: Self = figment.extract()?;
        log::trace!("Effective config: {:?}", config);
        Ok(config)
    }

    /// Write the config as TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, content).map_err(write_err)
    }
}
