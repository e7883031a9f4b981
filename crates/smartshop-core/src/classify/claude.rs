//! Claude CLI Backend
//!
//! ローカルにインストールされたClaude CLIを分類器として使う。
//!
//! ## 使用方法
//!
//! ### Claude CLI可用性チェック
//!
//! ```rust,ignore
//! use smartshop_core::classify::check_claude_cli;
//!
//! let available = check_claude_cli().await;
//! println!("Claude CLI available: {}", available);
//! ```
//!
//! ### 分類器として使う
//!
//! ```rust,ignore
//! use smartshop_core::classify::{ClaudeCliBackend, TextClassifier};
//!
//! let classifier = TextClassifier::with_backend(ClaudeCliBackend::new());
//! let result = classifier.classify("Lasagna").await;
//! ```

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{Result, ShopError};
use crate::item::ParsedItem;

use super::response::{build_prompt, parse_items};
use super::ClassifierBackend;

const CLAUDE_BIN: &str = "claude";

// ============================================================================
// CLI Operations
// ============================================================================

/// Claude CLIが利用可能かチェック
///
/// `claude --version` を実行して成功すればtrue
pub async fn check_claude_cli() -> bool {
    Command::new(CLAUDE_BIN)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Claude CLIを実行してプロンプトを処理
///
/// # Returns
/// Claude CLIの出力（stdout）
///
/// # Errors
/// * `ClaudeNotFound` - Claude CLIが見つからない場合
/// * `Classifier` - 実行に失敗した場合
pub async fn execute_claude(prompt: &str) -> Result<String> {
    let mut cmd = Command::new(CLAUDE_BIN);
    cmd.arg("--print");
    cmd.stdin(Stdio::piped());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ShopError::ClaudeNotFound
        } else {
            ShopError::classifier(format!("Failed to spawn claude: {}", e))
        }
    })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(prompt.as_bytes())
            .await
            .map_err(|e| ShopError::classifier(format!("Failed to write prompt: {}", e)))?;
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| ShopError::classifier(format!("Execution failed: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ShopError::classifier(format!(
            "Claude exited with error: {}",
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

// ============================================================================
// Backend
// ============================================================================

/// Claude CLIバックエンド
#[derive(Debug, Clone, Default)]
pub struct ClaudeCliBackend;

impl ClaudeCliBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ClassifierBackend for ClaudeCliBackend {
    fn name(&self) -> &str {
        "claude-cli"
    }

    async fn is_available(&self) -> bool {
        check_claude_cli().await
    }

    async fn classify(&self, text: &str) -> Result<Vec<ParsedItem>> {
        let output = execute_claude(&build_prompt(text)).await?;
        parse_items(&output)
    }
}
