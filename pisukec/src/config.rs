///
/// # Project Configuration
///
/// Settings come from an optional `pisuke.toml`, looked up from the entry
/// file's directory upward. Without one, every setting has a default.
///
/// ## Example pisuke.toml
///
/// ```toml
/// [build]
/// go = "/usr/local/go/bin/go"
/// keep_source = true
///
/// [modules]
/// root = "src"
/// ```
///
/// `modules.root` is the fallback directory for import resolution. A
/// relative root is taken relative to the directory holding the config
/// file (or the current directory when there is none).
///

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::modules::Resolver;

pub const CONFIG_FILE: &str = "pisuke.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub build: BuildSettings,
    pub modules: ModuleSettings,
    /// Directory of the file this config was read from.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSettings {
    pub go: String,
    pub keep_source: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            go: "go".to_string(),
            keep_source: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModuleSettings {
    pub root: PathBuf,
}

impl Default for ModuleSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

impl Config {
    pub fn from_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content, path)
    }

    /// The config governing `entry`: the nearest `pisuke.toml` in its
    /// directory or an ancestor, or the defaults.
    pub fn discover(entry: &Path) -> Result<Self, ConfigError> {
        match find_config(entry) {
            Some(path) => {
                tracing::debug!(config = %path.display(), "using project config");
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn module_root(&self) -> PathBuf {
        match &self.base_dir {
            Some(base) if self.modules.root.is_relative() => base.join(&self.modules.root),
            _ => self.modules.root.clone(),
        }
    }

    pub fn resolver(&self) -> Resolver {
        Resolver::new(self.module_root())
    }
}

fn find_config(entry: &Path) -> Option<PathBuf> {
    let start = if entry.is_dir() { Some(entry) } else { entry.parent() };
    let start = start.filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());

    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE))
        .find(|candidate| candidate.is_file())
}
