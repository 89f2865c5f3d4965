// Uploader configuration.
//
// Layered from lowest to highest precedence: built-in defaults, the user's
// `config-user.json`, environment variables, then command-line flags. The
// JSON file uses the same nested camelCase keys as the defaults below; any
// key it leaves out keeps its default.

use std::path::{Path, PathBuf};

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const USER_CONFIG_FILE: &str = "config-user.json";
const APP_DIR: &str = "flamingo-uploader";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EsdrConfig {
    pub root_url: String,
    pub api_root_url: String,
}

impl Default for EsdrConfig {
    fn default() -> Self {
        Self {
            root_url: "https://esdr.cmucreatelab.org".into(),
            api_root_url: "https://esdr.cmucreatelab.org/api/v1".into(),
        }
    }
}

/// OAuth client credentials the uploader identifies itself with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub name: String,
    pub secret: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name: "flamingo-uploader-command-line-client".into(),
            secret: "flamingo-water-quality-monitor".into(),
        }
    }
}

/// Credentials offered as defaults at the login prompt. Empty means none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultUser {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub esdr: EsdrConfig,
    pub client: ClientConfig,
    pub default_user: DefaultUser,
}

/// Command-line flags overriding any other configuration source.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    /// ESDR root URL (OAuth endpoint)
    #[arg(long, value_name = "URL")]
    pub esdr_root_url: Option<String>,

    /// ESDR API root URL
    #[arg(long, value_name = "URL")]
    pub esdr_api_root_url: Option<String>,

    /// OAuth client name
    #[arg(long)]
    pub client_name: Option<String>,

    /// OAuth client secret
    #[arg(long)]
    pub client_secret: Option<String>,

    /// Default ESDR username offered at the login prompt
    #[arg(long)]
    pub username: Option<String>,

    /// Default ESDR password offered at the login prompt
    #[arg(long)]
    pub password: Option<String>,
}

impl Config {
    /// Load defaults, the first user config file found, the environment,
    /// then `overrides`.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let mut config = match user_config_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.apply_overrides(overrides);
        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        let targets: [(&Option<String>, &mut String); 6] = [
            (&overrides.esdr_root_url, &mut self.esdr.root_url),
            (&overrides.esdr_api_root_url, &mut self.esdr.api_root_url),
            (&overrides.client_name, &mut self.client.name),
            (&overrides.client_secret, &mut self.client.secret),
            (&overrides.username, &mut self.default_user.username),
            (&overrides.password, &mut self.default_user.password),
        ];
        for (value, target) in targets {
            if let Some(value) = value {
                *target = value.clone();
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Override settings from variables returned by `lookup`.
    ///
    /// Recognised keys: `ESDR_ROOT_URL`, `ESDR_API_ROOT_URL`,
    /// `ESDR_CLIENT_NAME`, `ESDR_CLIENT_SECRET`, `ESDR_USERNAME` and
    /// `ESDR_PASSWORD`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let targets: [(&str, &mut String); 6] = [
            ("ESDR_ROOT_URL", &mut self.esdr.root_url),
            ("ESDR_API_ROOT_URL", &mut self.esdr.api_root_url),
            ("ESDR_CLIENT_NAME", &mut self.client.name),
            ("ESDR_CLIENT_SECRET", &mut self.client.secret),
            ("ESDR_USERNAME", &mut self.default_user.username),
            ("ESDR_PASSWORD", &mut self.default_user.password),
        ];
        for (key, target) in targets {
            if let Some(value) = lookup(key) {
                *target = value;
            }
        }
    }
}

/// `./config-user.json` if present, else the one in the user config dir.
fn user_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(USER_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(USER_CONFIG_FILE))
        .filter(|path| path.is_file())
}
