//! Application configuration for heritagekb.
//!
//! User config lives at `~/.heritagekb/heritagekb.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{HeritageError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "heritagekb.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".heritagekb";

// ---------------------------------------------------------------------------
// Config structs (matching heritagekb.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Upstream endpoints and HTTP settings.
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Minimum spacing between calls per provider.
    #[serde(default)]
    pub rate_limits: RateLimitsConfig,

    /// Retry policy for transient HTTP failures.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Output document settings.
    #[serde(default)]
    pub export: ExportConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Where the output document is written.
    #[serde(default = "default_output_path")]
    pub output_path: String,

    /// Where the checkpoint document is written.
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: String,

    /// Cap on candidates taken from each category listing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_per_category: Option<usize>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            checkpoint_path: default_checkpoint_path(),
            max_per_category: None,
        }
    }
}

fn default_output_path() -> String {
    "researched_sites.json".into()
}
fn default_checkpoint_path() -> String {
    ".heritagekb_checkpoint.json".into()
}

/// `[sources]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Root of the primary heritage source.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User-Agent for primary-source and encyclopedia requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// MediaWiki action API endpoint.
    #[serde(default = "default_encyclopedia_api_url")]
    pub encyclopedia_api_url: String,

    /// Nominatim root (search and reverse live beneath it).
    #[serde(default = "default_geocoder_url")]
    pub geocoder_url: String,

    /// Nominatim requires an identifying User-Agent.
    #[serde(default = "default_geocoder_user_agent")]
    pub geocoder_user_agent: String,

    /// Translation endpoint.
    #[serde(default = "default_translate_url")]
    pub translate_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            http_timeout_secs: default_http_timeout(),
            encyclopedia_api_url: default_encyclopedia_api_url(),
            geocoder_url: default_geocoder_url(),
            geocoder_user_agent: default_geocoder_user_agent(),
            translate_url: default_translate_url(),
        }
    }
}

fn default_base_url() -> String {
    "https://egymonuments.gov.eg".into()
}
fn default_user_agent() -> String {
    concat!("heritagekb/", env!("CARGO_PKG_VERSION")).into()
}
fn default_http_timeout() -> u64 {
    15
}
fn default_encyclopedia_api_url() -> String {
    "https://en.wikipedia.org/w/api.php".into()
}
fn default_geocoder_url() -> String {
    "https://nominatim.openstreetmap.org".into()
}
fn default_geocoder_user_agent() -> String {
    concat!("heritagekb/", env!("CARGO_PKG_VERSION"), " (educational project)").into()
}
fn default_translate_url() -> String {
    "https://translate.googleapis.com/translate_a/single".into()
}

/// `[rate_limits]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitsConfig {
    /// Minimum ms between geocoder calls (Nominatim policy is 1 req/s).
    #[serde(default = "default_geocode_ms")]
    pub geocode_ms: u64,

    /// Minimum ms between primary-source page loads.
    #[serde(default)]
    pub primary_ms: u64,

    /// Minimum ms between encyclopedia calls.
    #[serde(default)]
    pub encyclopedia_ms: u64,
}

impl Default for RateLimitsConfig {
    fn default() -> Self {
        Self {
            geocode_ms: default_geocode_ms(),
            primary_ms: 0,
            encyclopedia_ms: 0,
        }
    }
}

fn default_geocode_ms() -> u64 {
    1000
}

/// `[retry]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Growth factor between consecutive delays.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Upper bound on any single delay.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            multiplier: default_multiplier(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    1000
}
fn default_multiplier() -> f64 {
    2.0
}
fn default_max_delay_ms() -> u64 {
    8000
}

/// `[export]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Hold back records with validation issues instead of warning.
    #[serde(default)]
    pub strict: bool,
}

impl AppConfig {
    /// Reject values that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("sources.base_url", &self.sources.base_url),
            ("sources.encyclopedia_api_url", &self.sources.encyclopedia_api_url),
            ("sources.geocoder_url", &self.sources.geocoder_url),
            ("sources.translate_url", &self.sources.translate_url),
        ] {
            Url::parse(value)
                .map_err(|e| HeritageError::config(format!("{key} '{value}' is not a URL: {e}")))?;
        }
        if self.retry.max_attempts == 0 {
            return Err(HeritageError::config("retry.max_attempts must be at least 1"));
        }
        if !(self.retry.multiplier.is_finite() && self.retry.multiplier >= 1.0) {
            return Err(HeritageError::config("retry.multiplier must be >= 1.0"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.heritagekb/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| HeritageError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.heritagekb/heritagekb.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| HeritageError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        HeritageError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| HeritageError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| HeritageError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| HeritageError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
