//! Configuration for sieve.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (ANTHROPIC_API_KEY, SIEVE_REWRITE_MODEL,
//!    LANGSMITH_API_KEY, LANGSMITH_ENDPOINT)
//! 2. Config file: $SIEVE_CONFIG, else the nearest .sieve/config.yaml in the
//!    current directory or its parents, else <user config dir>/sieve/config.yaml
//! 3. Defaults

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::review::REVIEW_FILE_NAME;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const DEFAULT_REWRITE_MODEL: &str = "claude-sonnet-4-5-20250929";
const DEFAULT_REWRITE_MAX_TOKENS: u32 = 1024;
const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com";
const DEFAULT_LANGSMITH_ENDPOINT: &str = "https://api.smith.langchain.com";
const DEFAULT_LANGSMITH_WEB_URL: &str = "https://smith.langchain.com";
const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub review: Option<ReviewConfig>,
    #[serde(default)]
    pub rewrite: Option<RewriteConfig>,
    #[serde(default)]
    pub upload: Option<UploadConfig>,
    #[serde(default)]
    pub http: Option<HttpConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewConfig {
    /// Review file name, created next to the output file
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RewriteConfig {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub endpoint: Option<String>,
    pub web_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub timeout_seconds: Option<u64>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Review file name
    pub review_file_name: String,
    pub rewrite: RewriteSettings,
    pub upload: UploadSettings,
}

#[derive(Debug, Clone)]
pub struct RewriteSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for RewriteSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_REWRITE_MODEL.to_string(),
            max_tokens: DEFAULT_REWRITE_MAX_TOKENS,
            base_url: DEFAULT_ANTHROPIC_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub web_url: String,
    pub timeout_seconds: u64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_LANGSMITH_ENDPOINT.to_string(),
            web_url: DEFAULT_LANGSMITH_WEB_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            review_file_name: REVIEW_FILE_NAME.to_string(),
            rewrite: RewriteSettings::default(),
            upload: UploadSettings::default(),
        }
    }
}

/// Find config file: explicit env var, project directories, then user config dir
fn find_config_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("SIEVE_CONFIG") {
        return Some(PathBuf::from(path));
    }

    if let Ok(mut current) = std::env::current_dir() {
        loop {
            let config_path = current.join(".sieve").join("config.yaml");
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }
    }

    dirs::config_dir()
        .map(|dir| dir.join("sieve").join("config.yaml"))
        .filter(|path| path.exists())
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Merge file values and environment over the defaults
fn resolve(
    config_file: Option<PathBuf>,
    file: ConfigFile,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();
    let timeout_seconds = file
        .http
        .as_ref()
        .and_then(|h| h.timeout_seconds)
        .unwrap_or(DEFAULT_TIMEOUT_SECONDS);

    let review_file_name = file
        .review
        .and_then(|r| r.file_name)
        .unwrap_or(defaults.review_file_name);

    let rewrite_file = file.rewrite.as_ref();
    let rewrite = RewriteSettings {
        api_key: env("ANTHROPIC_API_KEY"),
        model: env("SIEVE_REWRITE_MODEL")
            .or_else(|| rewrite_file.and_then(|r| r.model.clone()))
            .unwrap_or(defaults.rewrite.model),
        max_tokens: rewrite_file
            .and_then(|r| r.max_tokens)
            .unwrap_or(defaults.rewrite.max_tokens),
        base_url: rewrite_file
            .and_then(|r| r.base_url.clone())
            .unwrap_or(defaults.rewrite.base_url),
        timeout_seconds,
    };

    let upload_file = file.upload.as_ref();
    let upload = UploadSettings {
        api_key: env("LANGSMITH_API_KEY"),
        endpoint: env("LANGSMITH_ENDPOINT")
            .or_else(|| upload_file.and_then(|u| u.endpoint.clone()))
            .unwrap_or(defaults.upload.endpoint),
        web_url: upload_file
            .and_then(|u| u.web_url.clone())
            .unwrap_or(defaults.upload.web_url),
        timeout_seconds,
    };

    ResolvedConfig {
        config_file,
        review_file_name,
        rewrite,
        upload,
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let config_file = find_config_file();

    let file = match &config_file {
        Some(path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    Ok(resolve(config_file, file, |key| {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }))
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}
