use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub scrape: ScrapeHttpConfig,
    #[serde(default)]
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// How often the scheduler loop checks for due tasks (seconds)
    #[serde(default = "default_scheduler_interval")]
    pub scheduler_interval_secs: u64,
    /// HTTP timeout for feed requests (seconds)
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Optional HTTP proxy for outbound requests
    #[serde(default)]
    pub proxy_url: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            scheduler_interval_secs: default_scheduler_interval(),
            request_timeout_secs: default_timeout(),
            proxy_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeHttpConfig {
    /// Navigation timeout per product page (seconds)
    #[serde(default = "default_page_timeout")]
    pub page_timeout_secs: u64,
    /// Upper bound on product URLs resolved from a single list page
    #[serde(default = "default_max_products")]
    pub max_products_per_source: usize,
}

impl Default for ScrapeHttpConfig {
    fn default() -> Self {
        Self {
            page_timeout_secs: default_page_timeout(),
            max_products_per_source: default_max_products(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// OpenAI API key; falls back to the OPENAI_API_KEY environment variable
    #[serde(default)]
    pub openai_api_key: Option<String>,
    /// Model used for content generation
    #[serde(default = "default_openai_model")]
    pub model: String,
    /// Max tokens for a body completion
    #[serde(default = "default_max_completion_tokens")]
    pub max_completion_tokens: u32,
    /// Max tokens for the title-generation call
    #[serde(default = "default_title_tokens")]
    pub title_max_tokens: u32,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            model: default_openai_model(),
            max_completion_tokens: default_max_completion_tokens(),
            title_max_tokens: default_title_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl AiConfig {
    /// Resolve the API key from config or environment
    pub fn api_key(&self) -> Option<String> {
        self.openai_api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("techwire")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_scheduler_interval() -> u64 {
    60
}

fn default_timeout() -> u64 {
    30
}

fn default_page_timeout() -> u64 {
    30
}

fn default_max_products() -> usize {
    200
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_completion_tokens() -> u32 {
    3000
}

fn default_title_tokens() -> u32 {
    60
}

fn default_temperature() -> f32 {
    0.7
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &std::path::Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from file or return defaults
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/techwire/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("techwire")
            .join("config.toml")
    }

    /// Get the database file path
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("techwire.db")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }
}
