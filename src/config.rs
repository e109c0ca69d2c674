use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{DeckError, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_WEB_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api_url: String,
    pub web_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            web_url: DEFAULT_WEB_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// Items per visible page.
    pub page_size: usize,
    /// Items per foreground request.
    pub fetch_limit: usize,
    /// Items per background prefetch request.
    pub prefetch_batch: usize,
    pub max_prefetch_batches: u32,
    /// Page buttons shown in the footer.
    pub window_size: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: 12,
            fetch_limit: 60,
            prefetch_batch: 500,
            max_prefetch_batches: 20,
            window_size: 4,
        }
    }
}

impl PagingConfig {
    /// Replace zero values with defaults.
    pub fn normalized(self) -> Self {
        let d = PagingConfig::default();
        let or = |v: usize, fallback: usize| if v == 0 { fallback } else { v };
        Self {
            page_size: or(self.page_size, d.page_size),
            fetch_limit: or(self.fetch_limit, d.fetch_limit),
            prefetch_batch: or(self.prefetch_batch, d.prefetch_batch),
            max_prefetch_batches: if self.max_prefetch_batches == 0 {
                d.max_prefetch_batches
            } else {
                self.max_prefetch_batches
            },
            window_size: or(self.window_size, d.window_size),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub paging: PagingConfig,
}

pub fn config_dir() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("promptdeck"))
}

fn config_path() -> Option<PathBuf> {
    Some(config_dir()?.join("config.toml"))
}

impl Config {
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Config::default();
        };

        let Ok(content) = std::fs::read_to_string(&path) else {
            return Config::default();
        };

        Self::parse(&content)
    }

    /// Parse, falling back to defaults on any error.
    pub fn parse(content: &str) -> Self {
        Self::try_parse(content).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "invalid config, using defaults");
            Config::default()
        })
    }

    pub fn try_parse(content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(content).map_err(|e| DeckError::Config(e.to_string()))?;
        config.paging = config.paging.normalized();
        config.server.api_url = base_url(&config.server.api_url)?;
        config.server.web_url = base_url(&config.server.web_url)?;
        Ok(config)
    }
}

/// Check that `url` is an http(s) URL and strip trailing slashes.
pub fn base_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(DeckError::Config(format!("not an http(s) URL: {:?}", url)));
    }
    Ok(trimmed.to_string())
}
