use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use crate::error::{Result, BazarrError};

fn default_scheme() -> String {
    "http".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    6767
}

fn default_search() -> bool {
    true
}

fn default_minimum_score() -> f64 {
    80.0
}

fn default_target_language() -> String {
    "is".to_string()
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_download_timeout_secs() -> u64 {
    180
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bazarr: BazarrConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BazarrConfig {
    /// URL scheme, usually http
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Bazarr host name or address
    #[serde(default = "default_host")]
    pub host: String,
    /// Bazarr port
    #[serde(default = "default_port")]
    pub port: u16,
    /// API key sent as X-API-KEY
    #[serde(default)]
    pub api_key: String,
    /// Path prefix when Bazarr is served below the root (e.g. "/bazarr")
    #[serde(default)]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Search providers when no English subtitle exists
    #[serde(default = "default_search")]
    pub search: bool,
    /// Candidates scoring strictly below this are never downloaded
    #[serde(default = "default_minimum_score")]
    pub minimum_score: f64,
    /// Language that gets backfilled by translation
    #[serde(default = "default_target_language")]
    pub target_language: String,
    /// Language of the subtitle used as translation source
    #[serde(default = "default_source_language")]
    pub source_language: String,
    /// Deadline for a single provider download call
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
    /// Dump fetched payloads at debug level
    #[serde(default)]
    pub debug: bool,
}

impl Default for BazarrConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            host: default_host(),
            port: default_port(),
            api_key: String::new(),
            base_url: String::new(),
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            search: default_search(),
            minimum_score: default_minimum_score(),
            target_language: default_target_language(),
            source_language: default_source_language(),
            download_timeout_secs: default_download_timeout_secs(),
            debug: false,
        }
    }
}

impl BazarrConfig {
    /// Base authority every API path is appended to, without a trailing slash
    pub fn base_url(&self) -> String {
        let prefix = self.base_url.trim_matches('/');
        if prefix.is_empty() {
            format!("{}://{}:{}", self.scheme, self.host, self.port)
        } else {
            format!("{}://{}:{}/{}", self.scheme, self.host, self.port, prefix)
        }
    }
}

impl WorkflowConfig {
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BazarrError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| BazarrError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| BazarrError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| BazarrError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Reject settings that would make every request fail
    pub fn validate(&self) -> Result<()> {
        if self.bazarr.api_key.trim().is_empty() {
            return Err(BazarrError::Config(
                "bazarr.api_key is empty; set it in the config file or BAZARR_API_KEY".to_string(),
            ));
        }
        if self.bazarr.port == 0 {
            return Err(BazarrError::Config("bazarr.port must be non-zero".to_string()));
        }
        if self.bazarr.host.trim().is_empty() {
            return Err(BazarrError::Config("bazarr.host is empty".to_string()));
        }
        if !self.workflow.minimum_score.is_finite() {
            return Err(BazarrError::Config(format!(
                "workflow.minimum_score must be a number, got {}",
                self.workflow.minimum_score
            )));
        }
        Ok(())
    }
}
