// src/config.rs

//! ezpkg configuration
//!
//! Loaded from TOML. Every key is optional:
//!
//! ```toml
//! [repository]
//! database = "/var/lib/ezpkg/ezpkg.db"
//! package_root = "/var/lib/ezpkg/packages"
//!
//! [install]
//! site_access = { "*" = "site" }
//! top_nodes = { "*" = "2" }
//! design = { "*" = "standard" }
//! restore_dates = true
//! non_interactive = true
//! user_id = 14
//! lock = true
//!
//! [transform]
//! command = "ezclass-upgrade"
//! args = ["--in-place"]
//! timeout_secs = 60
//!
//! [log]
//! file = "/var/log/ezpkg.log"
//! ```

use crate::db::paths;
use crate::error::{Error, Result};
use crate::install::{InstallOptions, Principal};
use crate::transform::CommandTransformer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// The site administrator
pub const DEFAULT_USER_ID: i64 = 14;

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub repository: RepositorySection,
    pub install: InstallSection,
    pub transform: TransformSection,
    pub log: LogSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositorySection {
    pub database: PathBuf,
    /// Defaults to `packages/` next to the database
    pub package_root: Option<PathBuf>,
}

impl Default for RepositorySection {
    fn default() -> Self {
        Self {
            database: PathBuf::from(paths::DEFAULT_DB_PATH),
            package_root: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallSection {
    pub site_access: BTreeMap<String, String>,
    pub top_nodes: BTreeMap<String, String>,
    pub design: BTreeMap<String, String>,
    pub restore_dates: bool,
    pub non_interactive: bool,
    pub user_id: i64,
    /// Hold a per-package lock file during install operations
    pub lock: bool,
}

impl Default for InstallSection {
    fn default() -> Self {
        let options = InstallOptions::default();
        Self {
            site_access: options.site_access_map,
            top_nodes: options.top_nodes_map,
            design: options.design_map,
            restore_dates: options.restore_dates,
            non_interactive: options.non_interactive,
            user_id: DEFAULT_USER_ID,
            lock: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSection {
    pub command: Option<String>,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for TransformSection {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            timeout_secs: crate::transform::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub file: Option<PathBuf>,
}

impl Config {
    /// Load the configuration
    ///
    /// An explicit `path` must exist. Without one the user config
    /// (`$XDG_CONFIG_HOME/ezpkg/config.toml`) is read when present, else the
    /// built-in defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_file(path),
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::load_file(&path),
                _ => {
                    debug!("No configuration file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::parse_str(&content)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn parse_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| Error::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.repository.database.as_os_str().is_empty() {
            return Err(Error::ConfigError("repository.database is empty".to_string()));
        }
        if self.install.user_id <= 0 {
            return Err(Error::ConfigError(format!(
                "install.user_id must be positive, got {}",
                self.install.user_id
            )));
        }
        if self.transform.timeout_secs == 0 {
            return Err(Error::ConfigError(
                "transform.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn database(&self) -> &Path {
        &self.repository.database
    }

    pub fn package_root(&self) -> PathBuf {
        self.repository
            .package_root
            .clone()
            .unwrap_or_else(|| paths::package_root(&self.repository.database))
    }

    /// Lock directory, when locking is enabled
    pub fn lock_dir(&self) -> Option<PathBuf> {
        self.install
            .lock
            .then(|| paths::lock_dir(&self.repository.database))
    }

    pub fn log_file(&self) -> PathBuf {
        self.log
            .file
            .clone()
            .unwrap_or_else(|| paths::log_path(&self.repository.database))
    }

    pub fn install_options(&self) -> InstallOptions {
        InstallOptions {
            site_access_map: self.install.site_access.clone(),
            top_nodes_map: self.install.top_nodes.clone(),
            design_map: self.install.design.clone(),
            restore_dates: self.install.restore_dates,
            non_interactive: self.install.non_interactive,
        }
    }

    pub fn principal(&self) -> Principal {
        Principal::new(self.install.user_id)
    }

    /// The configured class transformer, if any
    pub fn transformer(&self) -> Result<Option<CommandTransformer>> {
        let Some(command) = self.transform.command.as_deref() else {
            return Ok(None);
        };
        let transformer = CommandTransformer::new(command)?
            .with_args(self.transform.args.clone())
            .with_timeout(Duration::from_secs(self.transform.timeout_secs));
        Ok(Some(transformer))
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ezpkg").join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database(), Path::new("/var/lib/ezpkg/ezpkg.db"));
        assert_eq!(config.package_root(), PathBuf::from("/var/lib/ezpkg/packages"));
        assert_eq!(config.lock_dir(), Some(PathBuf::from("/var/lib/ezpkg/locks")));
        assert_eq!(config.log_file(), PathBuf::from("/var/lib/ezpkg/ezpkg.log"));
        assert_eq!(config.principal(), Principal::new(14));
        assert_eq!(config.install_options(), InstallOptions::default());
        assert!(config.transformer().unwrap().is_none());
    }

    #[test]
    fn test_parse_partial_file() {
        let config = Config::parse_str(
            r#"
            [repository]
            database = "/srv/site/ezpkg.db"

            [install]
            site_access = { "*" = "admin", "blog" = "blog_site" }
            user_id = 7
            lock = false

            [transform]
            timeout_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.package_root(), PathBuf::from("/srv/site/packages"));
        assert_eq!(config.lock_dir(), None);
        assert_eq!(config.principal().user_id, 7);
        assert_eq!(
            config.install.site_access.get("blog").map(String::as_str),
            Some("blog_site")
        );
        assert_eq!(config.install.design.get("*").map(String::as_str), Some("standard"));
        assert_eq!(config.transform.timeout_secs, 5);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Config::parse_str("[install]\nuser_id = 0\n"),
            Err(Error::ConfigError(_))
        ));
        assert!(matches!(
            Config::parse_str("[transform]\ntimeout_secs = 0\n"),
            Err(Error::ConfigError(_))
        ));
        assert!(Config::parse_str("[install\n").is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[log]\nfile = \"/tmp/ezpkg-test.log\"").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.log_file(), PathBuf::from("/tmp/ezpkg-test.log"));

        assert!(Config::load(Some(Path::new("/nonexistent/ezpkg.toml"))).is_err());
    }
}
