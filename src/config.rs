use crate::error::{Result, XcHelperError};
use crate::git::tagger::DEFAULT_REMOTE;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "XCHELPER_CONFIG";

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "xchelper.toml";

/// Represents the complete configuration for xchelper.
///
/// Contains option defaults, git settings and the external tool names.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    /// Option defaults keyed by the option's environment key,
    /// e.g. `DOCKER_BUILD_IMAGE_NAME = "swift:5.10"`.
    #[serde(default)]
    pub defaults: HashMap<String, String>,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_remote() -> String {
    DEFAULT_REMOTE.to_string()
}

/// Settings for `git-tag --push`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GitConfig {
    #[serde(default = "default_remote")]
    pub remote: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        GitConfig {
            remote: default_remote(),
        }
    }
}

fn default_swift() -> String {
    "swift".to_string()
}

fn default_docker() -> String {
    "docker".to_string()
}

fn default_tar() -> String {
    "tar".to_string()
}

fn default_aws() -> String {
    "aws".to_string()
}

/// Executables used for each external tool.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ToolsConfig {
    #[serde(default = "default_swift")]
    pub swift: String,

    #[serde(default = "default_docker")]
    pub docker: String,

    #[serde(default = "default_tar")]
    pub tar: String,

    #[serde(default = "default_aws")]
    pub aws: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        ToolsConfig {
            swift: default_swift(),
            docker: default_docker(),
            tar: default_tar(),
            aws: default_aws(),
        }
    }
}

impl Config {
    /// Configured default for an option's environment key.
    pub fn default_for(&self, env_key: &str) -> Option<&str> {
        self.defaults.get(env_key).map(|s| s.as_str())
    }
}

/// Locate the configuration file.
///
/// Order:
/// 1. Path named by `XCHELPER_CONFIG` in `env`
/// 2. `xchelper.toml` in `cwd`
/// 3. `.xchelper.toml` in the user config directory
pub fn find_config(env: &HashMap<String, String>, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = env.get(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }

    let local = cwd.join(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join(format!(".{}", LOCAL_CONFIG_FILE)))
        .filter(|path| path.exists())
}

/// Loads configuration from file or returns defaults.
///
/// # Arguments
/// * `config_path` - Optional path to a configuration file
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If the file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let Some(path) = config_path else {
        return Ok(Config::default());
    };

    let config_str = fs::read_to_string(path).map_err(|e| {
        XcHelperError::config(format!("Cannot read {}: {}", path.display(), e))
    })?;

    let config: Config = toml::from_str(&config_str).map_err(|e| {
        XcHelperError::config(format!("Cannot parse {}: {}", path.display(), e))
    })?;

    debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}
