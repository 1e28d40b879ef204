use crate::error::ConfigError;
use crate::models::Priority;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_START_HOUR: u32 = 17;
pub const DEFAULT_END_HOUR: u32 = 22;

const APP_DIR: &str = "dayplan";

// Shape of config.toml; every key is optional
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    start_hour: Option<u32>,
    end_hour: Option<u32>,
    default_priority: Option<Priority>,
    data_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub request_timeout_secs: Option<u64>,
    pub start_hour: u32,
    pub end_hour: u32,
    pub default_priority: Priority,
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: None,
            start_hour: DEFAULT_START_HOUR,
            end_hour: DEFAULT_END_HOUR,
            default_priority: Priority::Medium,
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Loads the config file (`DAYPLAN_CONFIG` or the user config dir) and
    /// applies environment overrides. A missing file means defaults.
    pub fn load() -> Result<Config, ConfigError> {
        let path = env::var_os("DAYPLAN_CONFIG")
            .map(PathBuf::from)
            .or_else(default_config_path);

        let mut config = match path {
            Some(path) if path.exists() => Config::from_file(&path)?,
            _ => Config::default(),
        };
        config.apply_env(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Config::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Config, ConfigError> {
        let file: FileConfig = toml::from_str(contents)?;
        let defaults = Config::default();

        Ok(Config {
            api_key: file.api_key.filter(|key| !key.trim().is_empty()),
            model: file.model.unwrap_or(defaults.model),
            base_url: file.base_url.unwrap_or(defaults.base_url),
            request_timeout_secs: file.request_timeout_secs,
            start_hour: file.start_hour.unwrap_or(defaults.start_hour),
            end_hour: file.end_hour.unwrap_or(defaults.end_hour),
            default_priority: file.default_priority.unwrap_or(defaults.default_priority),
            data_dir: file.data_dir.unwrap_or(defaults.data_dir),
        })
    }

    /// `GEMINI_API_KEY` wins over `API_KEY`, and both win over the file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = ["GEMINI_API_KEY", "API_KEY"]
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.trim().is_empty());

        if let Some(key) = key {
            self.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_hour >= self.end_hour || self.end_hour > 24 {
            return Err(ConfigError::InvalidWindow {
                start: self.start_hour,
                end: self.end_hour,
            });
        }
        Ok(())
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("dayplan.log")
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".dayplan"))
}
