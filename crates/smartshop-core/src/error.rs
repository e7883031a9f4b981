use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShopError {
    #[error("Ambiguous item id '{prefix}' - matches {count} items")]
    AmbiguousId { prefix: String, count: usize },

    #[error("Failed to parse config {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Unknown config key: {key}")]
    ConfigKeyNotFound { key: String },

    #[error("Invalid value for {key}: '{value}'")]
    InvalidConfigValue { key: String, value: String },

    #[error("Invalid view '{value}' - expected 'all' or 'pending'")]
    InvalidView { value: String },

    #[error("Classifier error: {message}")]
    Classifier { message: String },

    #[error("Claude CLI not found - install it or choose another classifier provider")]
    ClaudeNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Home directory not found")]
    HomeNotFound,
}

pub type Result<T> = std::result::Result<T, ShopError>;

impl ShopError {
    pub fn classifier(message: impl Into<String>) -> Self {
        Self::Classifier {
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AmbiguousId { .. } => 2,
            Self::ConfigParse { .. } | Self::ConfigKeyNotFound { .. } => 3,
            Self::InvalidConfigValue { .. } | Self::InvalidView { .. } => 4,
            _ => 1,
        }
    }
}
