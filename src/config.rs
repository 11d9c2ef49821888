use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    pub newsapi_key: Option<String>,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_api_page_size")]
    pub api_page_size: usize,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("newsfeed");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("news.db").to_string_lossy().to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_api_page_size() -> usize {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            newsapi_key: None,
            bind_addr: default_bind_addr(),
            request_timeout_secs: default_request_timeout(),
            api_page_size: default_api_page_size(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    /// A missing file is created with defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_path);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(&config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("newsfeed")
            .join("config.toml")
    }

    fn validate(&self) -> Result<()> {
        if self.api_page_size == 0 {
            return Err(AppError::Config("api_page_size must be positive".to_string()));
        }
        Ok(())
    }
}
