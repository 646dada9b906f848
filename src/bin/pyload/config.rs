use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Connection settings persisted between invocations
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Config {
    /// Load config from `path`, a missing file yields an empty config
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Save config to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    /// Overrides stored values with the ones given on the command line
    pub fn merge(
        &mut self,
        api_url: Option<String>,
        username: Option<String>,
        password: Option<String>,
    ) {
        if api_url.is_some() {
            self.api_url = api_url;
        }
        if username.is_some() {
            self.username = username;
        }
        if password.is_some() {
            self.password = password;
        }
    }

    /// Returns `(api_url, username, password)` once all three are known
    pub fn credentials(&self) -> Option<(&str, &str, &str)> {
        match (&self.api_url, &self.username, &self.password) {
            (Some(url), Some(user), Some(pass))
                if !url.is_empty() && !user.is_empty() && !pass.is_empty() =>
            {
                Some((url.as_str(), user.as_str(), pass.as_str()))
            }
            _ => None,
        }
    }

    /// Default config file location, `~/.config/pyloadapi/.pyload_config.json`
    /// on every platform
    pub fn default_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;

        Ok(Self::path_in(&home_dir))
    }

    fn path_in(home_dir: &Path) -> PathBuf {
        home_dir
            .join(".config")
            .join("pyloadapi")
            .join(".pyload_config.json")
    }
}
