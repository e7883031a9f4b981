//! # Classify Module
//!
//! 自由記述テキストを `(name, category)` の列に変換する。
//!
//! ## 設計目的
//!
//! 呼び出し側から見て分類は**必ず成功する**。リモート分類器が使えない、
//! または失敗した場合はローカルの決定的な分割にフォールバックし、
//! どちらの経路を通ったかを [`ClassificationOutcome`] で返す。
//!
//! | 状況 | 結果 | カテゴリ |
//! |------|------|----------|
//! | リモート成功 | `Remote` | 分類器が付与 |
//! | 未設定（APIキーなし等） | `NotConfigured` | `"General"` |
//! | 呼び出し失敗 | `RemoteFailed` | `"Uncategorized"` |
//!
//! ## モジュール構成
//!
//! - `split`: ローカル分割
//! - `response`: 指示文と応答パース
//! - `gemini`: Gemini APIバックエンド
//! - `claude`: Claude CLIバックエンド
//!
//! ## 使用例
//!
//! ### ローカル分割
//!
//! ```rust
//! use smartshop_core::classify::{split_simple, split_smart};
//!
//! assert_eq!(split_simple("Milk, Eggs"), vec!["Milk", "Eggs"]);
//! assert_eq!(split_smart("Milk\nEggs, Bread"), vec!["Milk", "Eggs", "Bread"]);
//! ```
//!
//! ### 完全な使用例（外部依存あり）
//!
//! ```rust,ignore
//! use smartshop_core::classify::TextClassifier;
//! use smartshop_core::Config;
//!
//! let config = Config::load(base_dir)?;
//! let classifier = TextClassifier::from_config(&config.classifier)?;
//! let result = classifier.classify("Lasagna for four").await;
//! for item in &result.items {
//!     println!("{} ({})", item.name, item.category);
//! }
//! ```

mod claude;
mod gemini;
mod response;
mod split;

use std::fmt;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::{ClassifierConfig, ClassifierProvider};
use crate::error::Result;
use crate::item::{ParsedItem, GENERAL_CATEGORY, UNCATEGORIZED_CATEGORY};

// Re-exports
pub use claude::{check_claude_cli, execute_claude, ClaudeCliBackend};
pub use gemini::{GeminiBackend, DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL};
pub use response::{build_prompt, parse_items};
pub use split::{fallback_items, split_simple, split_smart};

/// リモート分類器の抽象
#[async_trait]
pub trait ClassifierBackend: Send + Sync {
    /// ログ・警告用の名前
    fn name(&self) -> &str;

    /// 呼び出し可能か（未設定ならローカル分割へ）
    async fn is_available(&self) -> bool {
        true
    }

    /// テキストを分類。エラーは呼び出し側でフォールバックに変換される
    async fn classify(&self, text: &str) -> Result<Vec<ParsedItem>>;
}

/// どの経路で分類されたか
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationOutcome {
    /// リモート分類器の結果
    Remote,
    /// リモート分類器が未設定
    NotConfigured,
    /// リモート呼び出しが失敗
    RemoteFailed { reason: String },
}

impl ClassificationOutcome {
    pub fn is_fallback(&self) -> bool {
        !matches!(self, Self::Remote)
    }
}

impl fmt::Display for ClassificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote => write!(f, "classified"),
            Self::NotConfigured => write!(f, "not configured"),
            Self::RemoteFailed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// 分類結果
#[derive(Debug, Clone)]
pub struct Classification {
    pub items: Vec<ParsedItem>,
    pub outcome: ClassificationOutcome,
    /// 表示用の警告メッセージ
    pub warnings: Vec<String>,
}

/// テキスト分類アダプタ
pub struct TextClassifier {
    backend: Option<Box<dyn ClassifierBackend>>,
}

impl fmt::Debug for TextClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextClassifier")
            .field("backend", &self.backend.as_ref().map(|b| b.name()))
            .finish()
    }
}

impl TextClassifier {
    /// リモート分類器なし（常にローカル分割）
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    pub fn with_backend(backend: impl ClassifierBackend + 'static) -> Self {
        Self {
            backend: Some(Box::new(backend)),
        }
    }

    /// 設定から構築
    ///
    /// GeminiはAPIキーが解決できた場合のみバックエンドを持つ。
    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        match config.provider {
            ClassifierProvider::Gemini => match config.resolve_api_key() {
                Some(key) => Ok(Self::with_backend(GeminiBackend::new(
                    key,
                    &config.model,
                    &config.endpoint,
                )?)),
                None => {
                    debug!(env = %config.api_key_env, "no Gemini API key found");
                    Ok(Self::disabled())
                }
            },
            ClassifierProvider::ClaudeCli => Ok(Self::with_backend(ClaudeCliBackend::new())),
            ClassifierProvider::None => Ok(Self::disabled()),
        }
    }

    /// バックエンド名（未設定ならNone）
    pub fn backend_name(&self) -> Option<&str> {
        self.backend.as_ref().map(|b| b.name())
    }

    /// テキストを分類。失敗しない。
    pub async fn classify(&self, text: &str) -> Classification {
        let Some(backend) = self.backend.as_ref() else {
            debug!("no classifier configured, using local split");
            return Self::not_configured(text, "No classifier configured".to_string());
        };

        if !backend.is_available().await {
            debug!(backend = backend.name(), "classifier unavailable, using local split");
            return Self::not_configured(
                text,
                format!("{} classifier not available", backend.name()),
            );
        }

        match backend.classify(text).await {
            Ok(items) => {
                debug!(backend = backend.name(), count = items.len(), "classified input");
                Classification {
                    items,
                    outcome: ClassificationOutcome::Remote,
                    warnings: Vec::new(),
                }
            }
            Err(e) => {
                warn!(backend = backend.name(), error = %e, "classification failed, using local split");
                Classification {
                    items: fallback_items(text, UNCATEGORIZED_CATEGORY),
                    outcome: ClassificationOutcome::RemoteFailed {
                        reason: e.to_string(),
                    },
                    warnings: vec![format!(
                        "Classification failed, items left uncategorized: {}",
                        e
                    )],
                }
            }
        }
    }

    fn not_configured(text: &str, reason: String) -> Classification {
        Classification {
            items: fallback_items(text, GENERAL_CATEGORY),
            outcome: ClassificationOutcome::NotConfigured,
            warnings: vec![format!("{}, items filed under {}", reason, GENERAL_CATEGORY)],
        }
    }
}

impl Default for TextClassifier {
    fn default() -> Self {
        Self::disabled()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StubBackend;
    use super::*;

    fn pairs(items: &[ParsedItem]) -> Vec<(&str, &str)> {
        items
            .iter()
            .map(|i| (i.name.as_str(), i.category.as_str()))
            .collect()
    }

    #[tokio::test]
    async fn test_not_configured_falls_back_to_general() {
        let classifier = TextClassifier::disabled();
        let result = classifier.classify("Milk, Eggs, Bread").await;
        assert_eq!(result.outcome, ClassificationOutcome::NotConfigured);
        assert_eq!(
            pairs(&result.items),
            vec![("Milk", "General"), ("Eggs", "General"), ("Bread", "General")]
        );
        assert_eq!(result.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_call_failure_falls_back_to_uncategorized() {
        let classifier = TextClassifier::with_backend(StubBackend::failing("connection refused"));
        let result = classifier.classify("Milk, Eggs, Bread").await;
        assert!(matches!(
            result.outcome,
            ClassificationOutcome::RemoteFailed { ref reason } if reason.contains("connection refused")
        ));
        assert_eq!(
            pairs(&result.items),
            vec![
                ("Milk", "Uncategorized"),
                ("Eggs", "Uncategorized"),
                ("Bread", "Uncategorized")
            ]
        );
    }

    #[tokio::test]
    async fn test_unavailable_backend_counts_as_not_configured() {
        let classifier = TextClassifier::with_backend(StubBackend::unavailable());
        let result = classifier.classify("Milk\nEggs").await;
        assert_eq!(result.outcome, ClassificationOutcome::NotConfigured);
        assert_eq!(pairs(&result.items), vec![("Milk", "General"), ("Eggs", "General")]);
    }

    #[tokio::test]
    async fn test_remote_success_passes_items_through() {
        let classifier = TextClassifier::with_backend(StubBackend::ok(vec![
            ParsedItem::new("Ground beef", "Meat"),
            ParsedItem::new("Ricotta", "Dairy"),
        ]));
        let result = classifier.classify("Lasagna").await;
        assert_eq!(result.outcome, ClassificationOutcome::Remote);
        assert!(!result.outcome.is_fallback());
        assert!(result.warnings.is_empty());
        assert_eq!(pairs(&result.items), vec![("Ground beef", "Meat"), ("Ricotta", "Dairy")]);
    }

    #[tokio::test]
    async fn test_remote_empty_result_is_not_a_fallback() {
        let classifier = TextClassifier::with_backend(StubBackend::ok(Vec::new()));
        let result = classifier.classify("Milk, Eggs").await;
        assert_eq!(result.outcome, ClassificationOutcome::Remote);
        assert!(result.items.is_empty());
    }

    #[test]
    fn test_from_config_without_key_is_disabled() {
        let config = ClassifierConfig {
            api_key: None,
            api_key_env: "SMARTSHOP_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..ClassifierConfig::default()
        };
        let classifier = TextClassifier::from_config(&config).unwrap();
        assert!(classifier.backend_name().is_none());
    }

    #[test]
    fn test_from_config_with_inline_key_uses_gemini() {
        let config = ClassifierConfig {
            api_key: Some("test-key".to_string()),
            ..ClassifierConfig::default()
        };
        let classifier = TextClassifier::from_config(&config).unwrap();
        assert_eq!(classifier.backend_name(), Some("gemini"));
    }

    #[test]
    fn test_from_config_provider_none() {
        let config = ClassifierConfig {
            provider: ClassifierProvider::None,
            api_key: Some("test-key".to_string()),
            ..ClassifierConfig::default()
        };
        let classifier = TextClassifier::from_config(&config).unwrap();
        assert!(classifier.backend_name().is_none());
    }

    #[test]
    fn test_from_config_claude_cli() {
        let config = ClassifierConfig {
            provider: ClassifierProvider::ClaudeCli,
            ..ClassifierConfig::default()
        };
        let classifier = TextClassifier::from_config(&config).unwrap();
        assert_eq!(classifier.backend_name(), Some("claude-cli"));
    }
}
