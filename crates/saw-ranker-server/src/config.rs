use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8787";
pub const DEFAULT_DATASET_PATH: &str = "./dataset.csv";
pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const DEFAULT_MAX_PAGE_SIZE: usize = 200;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid http address {0:?}: expected host:port")]
    InvalidAddr(String),
    #[error("dataset path must not be empty")]
    EmptyDatasetPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub http_addr: String,
    pub dataset_path: PathBuf,
    pub page_size: usize,
    pub max_page_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl ServerConfig {
    /// Reads `SAW_RANKER_*` variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let http_addr = lookup("SAW_RANKER_HTTP_ADDR")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        validate_addr(&http_addr)?;

        let dataset_path = match lookup("SAW_RANKER_DATASET") {
            Some(v) if v.trim().is_empty() => return Err(ConfigError::EmptyDatasetPath),
            Some(v) => PathBuf::from(v.trim()),
            None => PathBuf::from(DEFAULT_DATASET_PATH),
        };

        let max_page_size = env_usize(
            lookup("SAW_RANKER_MAX_PAGE_SIZE"),
            DEFAULT_MAX_PAGE_SIZE,
            1,
            5000,
        );
        let page_size =
            env_usize(lookup("SAW_RANKER_PAGE_SIZE"), DEFAULT_PAGE_SIZE, 1, 500).min(max_page_size);

        Ok(Self {
            http_addr,
            dataset_path,
            page_size,
            max_page_size,
        })
    }

    /// Page size for a raw `limit` query value.
    pub fn effective_limit(&self, raw: Option<&str>) -> usize {
        raw.and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|v| *v >= 1)
            .unwrap_or(self.page_size)
            .min(self.max_page_size)
    }
}

fn env_usize(raw: Option<String>, default: usize, min: usize, max: usize) -> usize {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}

fn validate_addr(addr: &str) -> Result<(), ConfigError> {
    match addr.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => Ok(()),
        _ => Err(ConfigError::InvalidAddr(addr.to_string())),
    }
}
