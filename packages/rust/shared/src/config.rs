//! Application configuration for docdistill.
//!
//! User config lives at `~/.docdistill/docdistill.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DistillError, Result};
use crate::types::FieldNaming;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docdistill.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docdistill";

/// GitBook's "powered by" trademark link, present in every GitBook footer.
pub const GITBOOK_TRADEMARK_LINK: &str =
    "https://www.gitbook.com/?utm_source=content&utm_medium=trademark&utm_campaign=-LocuLeNcXinpTOZxNu0";

// ---------------------------------------------------------------------------
// Config structs (matching docdistill.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// HTTP fetch policy.
    #[serde(default)]
    pub fetch: FetchPolicyConfig,

    /// Extraction settings.
    #[serde(default)]
    pub extract: ExtractPolicyConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default output directory.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Topic label written into every page tree and prompt.
    /// Falls back to the root URL's host when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    /// Key naming used in the page-tree JSON files.
    #[serde(default)]
    pub field_naming: FieldNaming,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            topic: None,
            field_naming: FieldNaming::default(),
        }
    }
}

fn default_output_dir() -> String {
    "data".into()
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchPolicyConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts after a failed fetch.
    #[serde(default)]
    pub retries: u32,

    /// Base delay between retries, multiplied by the attempt number.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,

    /// Delay before every request.
    #[serde(default)]
    pub rate_limit_ms: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchPolicyConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            retries: 0,
            retry_backoff_ms: default_retry_backoff(),
            rate_limit_ms: 0,
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_retry_backoff() -> u64 {
    500
}
fn default_user_agent() -> String {
    concat!("docdistill/", env!("CARGO_PKG_VERSION")).into()
}

/// `[extract]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractPolicyConfig {
    /// Layout preset: "auto", "gitbook" or "generic".
    #[serde(default = "default_layout")]
    pub layout: String,

    /// External links never recorded.
    #[serde(default = "default_ignore_links")]
    pub ignore_links: Vec<String>,

    /// Selector overrides applied on top of the preset.
    #[serde(default)]
    pub selectors: SelectorOverrides,
}

impl Default for ExtractPolicyConfig {
    fn default() -> Self {
        Self {
            layout: default_layout(),
            ignore_links: default_ignore_links(),
            selectors: SelectorOverrides::default(),
        }
    }
}

fn default_layout() -> String {
    "auto".into()
}
fn default_ignore_links() -> Vec<String> {
    vec![GITBOOK_TRADEMARK_LINK.into()]
}

/// `[extract.selectors]`: any field left unset keeps the preset's selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_container: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_fragment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_found_marker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_topic_container: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_topic_item: Option<String>,
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime crawl configuration.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Extra attempts after a failed fetch (0 = single attempt).
    pub retries: u32,
    /// Base backoff between retries in ms.
    pub retry_backoff_ms: u64,
    /// Delay before every request in ms.
    pub rate_limit_ms: u64,
    /// User-Agent header.
    pub user_agent: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for CrawlConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.fetch.timeout_secs,
            retries: config.fetch.retries,
            retry_backoff_ms: config.fetch.retry_backoff_ms,
            rate_limit_ms: config.fetch.rate_limit_ms,
            user_agent: config.fetch.user_agent.clone(),
        }
    }
}

/// Runtime extraction configuration.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Topic label; `None` means "derive from the root URL".
    pub topic: Option<String>,
    /// Layout preset name.
    pub layout: String,
    /// Selector overrides.
    pub selectors: SelectorOverrides,
    /// External links never recorded.
    pub ignore_links: Vec<String>,
    /// Key naming for page-tree JSON.
    pub field_naming: FieldNaming,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ExtractConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            topic: config.defaults.topic.clone(),
            layout: config.extract.layout.clone(),
            selectors: config.extract.selectors.clone(),
            ignore_links: config.extract.ignore_links.clone(),
            field_naming: config.defaults.field_naming,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docdistill/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DistillError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docdistill/docdistill.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| DistillError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DistillError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DistillError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DistillError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DistillError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
