//! Configuration file discovery for the CLI
//!
//! A [`ConfigSearch`] lists the places a `config.toml` may live and loads
//! the first one present, reporting which one won as a [`ConfigSource`].

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use trellis::{TrellisError, config::AppConfig};

/// Relative path checked before the platform config directory.
const LOCAL_CONFIG: &str = "trellis/config.toml";

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Missing configuration file: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Failed to read configuration file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<ConfigError> for TrellisError {
    fn from(err: ConfigError) -> Self {
        TrellisError::Config(err.to_string())
    }
}

/// Where the configuration in effect came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// The `--config` argument.
    Explicit(PathBuf),
    /// `trellis/config.toml` under the working directory.
    Local(PathBuf),
    /// The per-user platform config directory.
    Platform(PathBuf),
    /// No file; built-in defaults.
    Defaults,
}

impl ConfigSource {
    fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::Explicit(path)
            | ConfigSource::Local(path)
            | ConfigSource::Platform(path) => Some(path),
            ConfigSource::Defaults => None,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Explicit(path) => write!(f, "{} (--config)", path.display()),
            ConfigSource::Local(path) => write!(f, "{} (local)", path.display()),
            ConfigSource::Platform(path) => write!(f, "{} (user)", path.display()),
            ConfigSource::Defaults => f.write_str("built-in defaults"),
        }
    }
}

/// Ordered list of configuration locations.
///
/// An explicit path always wins and must exist. Otherwise the local file
/// is preferred over the platform one, and defaults apply when neither is
/// present.
#[derive(Debug, Clone)]
pub struct ConfigSearch {
    explicit: Option<PathBuf>,
    local: PathBuf,
    platform: Option<PathBuf>,
}

impl ConfigSearch {
    /// The standard locations, plus `explicit` if given.
    pub fn standard(explicit: Option<impl AsRef<Path>>) -> Self {
        let platform = ProjectDirs::from("com", "trellis", "trellis")
            .map(|dirs| dirs.config_dir().join("config.toml"));
        if platform.is_none() {
            debug!("Could not determine platform-specific config directory");
        }
        Self {
            explicit: explicit.map(|path| path.as_ref().to_path_buf()),
            local: PathBuf::from(LOCAL_CONFIG),
            platform,
        }
    }

    /// Picks the location to load without reading it.
    ///
    /// # Errors
    ///
    /// Fails if an explicit path was given and does not exist.
    pub fn locate(&self) -> Result<ConfigSource, ConfigError> {
        if let Some(path) = &self.explicit {
            if !path.exists() {
                return Err(ConfigError::MissingFile(path.clone()));
            }
            return Ok(ConfigSource::Explicit(path.clone()));
        }

        if self.local.exists() {
            return Ok(ConfigSource::Local(self.local.clone()));
        }

        match &self.platform {
            Some(path) if path.exists() => Ok(ConfigSource::Platform(path.clone())),
            Some(path) => {
                debug!(path:? = path; "System configuration file not found");
                Ok(ConfigSource::Defaults)
            }
            None => Ok(ConfigSource::Defaults),
        }
    }

    /// Loads the configuration from the first location present.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Explicit path is provided but file doesn't exist
    /// - Config file exists but cannot be read or parsed
    pub fn load(&self) -> Result<(AppConfig, ConfigSource), ConfigError> {
        let source = self.locate()?;
        let config = match source.path() {
            Some(path) => {
                info!(source = source.to_string(); "Loading configuration");
                load_config_file(path)?
            }
            None => {
                debug!("No configuration file found, using default configuration");
                AppConfig::default()
            }
        };
        Ok((config, source))
    }
}

/// Find and load configuration, see [`ConfigSearch`].
///
/// # Errors
///
/// Returns error if an explicit path is missing or a found file is invalid.
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, TrellisError> {
    let (config, _) = ConfigSearch::standard(explicit_path).load()?;
    Ok(config)
}

fn load_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use tempfile::{TempDir, tempdir};

    use super::*;

    /// A search rooted in a temp dir, with local and platform files at
    /// fixed places that tests create as needed.
    fn search_in(dir: &TempDir, explicit: Option<PathBuf>) -> ConfigSearch {
        ConfigSearch {
            explicit,
            local: dir.path().join("local.toml"),
            platform: Some(dir.path().join("user.toml")),
        }
    }

    #[test]
    fn test_explicit_path_is_loaded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[history]\nlimit = 7\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.history().limit(), 7);
    }

    #[test]
    fn test_missing_explicit_path_is_config_error() {
        let dir = tempdir().unwrap();
        let err = load_config(Some(dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, TrellisError::Config(msg) if msg.starts_with("Missing")));
    }

    #[test]
    fn test_missing_explicit_path_ignores_other_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("local.toml"), "").unwrap();
        let search = search_in(&dir, Some(dir.path().join("absent.toml")));
        assert!(matches!(search.locate(), Err(ConfigError::MissingFile(_))));
    }

    #[test]
    fn test_invalid_toml_names_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[history\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(
            err,
            TrellisError::Config(msg)
                if msg.starts_with("Failed to parse") && msg.contains("config.toml")
        ));
    }

    #[test]
    fn test_local_file_wins_over_platform() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("local.toml"), "[history]\nlimit = 3\n").unwrap();
        fs::write(dir.path().join("user.toml"), "[history]\nlimit = 9\n").unwrap();

        let (config, source) = search_in(&dir, None).load().unwrap();
        assert_eq!(config.history().limit(), 3);
        assert_eq!(source, ConfigSource::Local(dir.path().join("local.toml")));
    }

    #[test]
    fn test_platform_file_then_defaults() {
        let dir = tempdir().unwrap();
        let search = search_in(&dir, None);
        let (config, source) = search.load().unwrap();
        assert_eq!(source, ConfigSource::Defaults);
        assert_eq!(config.history().limit(), AppConfig::default().history().limit());

        fs::write(dir.path().join("user.toml"), "[history]\nlimit = 9\n").unwrap();
        let (config, source) = search.load().unwrap();
        assert_eq!(config.history().limit(), 9);
        assert!(matches!(source, ConfigSource::Platform(_)));
        assert!(source.to_string().ends_with("(user)"));
    }
}
