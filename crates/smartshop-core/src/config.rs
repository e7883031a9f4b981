use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classify::{DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL};
use crate::error::{Result, ShopError};
use crate::persist::DEFAULT_SLOT;

const CONFIG_FILE: &str = "config.toml";
const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Default config template with rich comments
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# smartshop configuration file
# Location: ~/.smartshop/config.toml

[classifier]
# Which service splits and categorizes "smart add" input
# Values: "gemini", "claude-cli", "none"
# Default: "gemini"
provider = "gemini"

# Gemini model name
model = "gemini-2.5-flash"

# Environment variable holding the Gemini API key.
# Without a key, smart add files everything under "General".
api_key_env = "GEMINI_API_KEY"

# Inline key (takes precedence over api_key_env)
# api_key = ""

endpoint = "https://generativelanguage.googleapis.com/v1beta"

[storage]
# Name of the slot the list is saved under (data/<slot>.json)
slot = "smartshop_items_v1"
"#;

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifierProvider {
    #[default]
    Gemini,
    ClaudeCli,
    None,
}

impl ClassifierProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::ClaudeCli => "claude-cli",
            Self::None => "none",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "gemini" => Some(Self::Gemini),
            "claude-cli" | "claude" => Some(Self::ClaudeCli),
            "none" | "off" => Some(Self::None),
            _ => None,
        }
    }
}

/// Classifier-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub provider: ClassifierProvider,

    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Inline API key (overrides api_key_env)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

fn default_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_GEMINI_ENDPOINT.to_string()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: ClassifierProvider::default(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            api_key: None,
            endpoint: default_endpoint(),
        }
    }
}

impl ClassifierConfig {
    /// Inline key first, then the configured environment variable.
    /// Blank values count as absent.
    pub fn resolve_api_key(&self) -> Option<String> {
        let inline = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        inline.or_else(|| {
            std::env::var(&self.api_key_env)
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
        })
    }
}

/// Storage-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_slot")]
    pub slot: String,
}

fn default_slot() -> String {
    DEFAULT_SLOT.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            slot: default_slot(),
        }
    }
}

impl Config {
    /// Load config from base directory
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content).map_err(|e| ShopError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        if !is_valid_slot(&config.storage.slot) {
            return Err(ShopError::InvalidConfigValue {
                key: "storage.slot".to_string(),
                value: config.storage.slot,
            });
        }

        Ok(config)
    }

    /// Save config to base directory
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Get config file path
    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE)
    }

    /// Initialize config with default template (rich comments)
    pub fn init(base_dir: &Path) -> Result<PathBuf> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        if !path.exists() {
            fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
        }

        Ok(path)
    }

    /// Get a config value by dot-notation key
    pub fn get(&self, key: &str) -> Option<String> {
        self.list()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Set a config value by dot-notation key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || ShopError::InvalidConfigValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        match key {
            "classifier.provider" => {
                self.classifier.provider = ClassifierProvider::parse(value).ok_or_else(invalid)?;
            }
            "classifier.model" => {
                self.classifier.model = non_empty(value).ok_or_else(invalid)?;
            }
            "classifier.api_key_env" => {
                self.classifier.api_key_env = non_empty(value).ok_or_else(invalid)?;
            }
            "classifier.api_key" => {
                self.classifier.api_key = non_empty(value);
            }
            "classifier.endpoint" => {
                self.classifier.endpoint = non_empty(value).ok_or_else(invalid)?;
            }
            "storage.slot" => {
                self.storage.slot = non_empty(value)
                    .filter(|s| is_valid_slot(s))
                    .ok_or_else(invalid)?;
            }
            _ => {
                return Err(ShopError::ConfigKeyNotFound {
                    key: key.to_string(),
                })
            }
        }
        Ok(())
    }

    /// List all config keys with their current values
    pub fn list(&self) -> Vec<(String, String)> {
        vec![
            (
                "classifier.provider".to_string(),
                self.classifier.provider.as_str().to_string(),
            ),
            ("classifier.model".to_string(), self.classifier.model.clone()),
            (
                "classifier.api_key_env".to_string(),
                self.classifier.api_key_env.clone(),
            ),
            (
                "classifier.api_key".to_string(),
                match &self.classifier.api_key {
                    Some(_) => "********".to_string(),
                    None => "(unset)".to_string(),
                },
            ),
            (
                "classifier.endpoint".to_string(),
                self.classifier.endpoint.clone(),
            ),
            ("storage.slot".to_string(), self.storage.slot.clone()),
        ]
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Slot names become file names under `data/`
fn is_valid_slot(slot: &str) -> bool {
    !slot.is_empty()
        && slot
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
