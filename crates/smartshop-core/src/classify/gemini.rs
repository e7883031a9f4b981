//! Gemini Backend
//!
//! Gemini `generateContent` APIをJSONモードで呼び出す。
//! APIキーがある場合のみ構築される。

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{Result, ShopError};
use crate::item::ParsedItem;

use super::response::{build_prompt, parse_items};
use super::ClassifierBackend;

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Gemini APIバックエンド
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiBackend {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("smartshop/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ShopError::classifier(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: endpoint.into(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl ClassifierBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn classify(&self, text: &str) -> Result<Vec<ParsedItem>> {
        debug!(model = %self.model, "sending classification request to Gemini");

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&request_body(text))
            .send()
            .await
            .map_err(|e| ShopError::classifier(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ShopError::classifier(format!(
                "Gemini returned {}: {}",
                status,
                truncate(&body, 200)
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ShopError::classifier(format!("Invalid Gemini response body: {}", e)))?;

        parse_items(&body.text())
    }
}

/// JSONモードのリクエストボディ
fn request_body(text: &str) -> Value {
    json!({
        "contents": [{
            "parts": [{ "text": build_prompt(text) }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING", "description": "The name of the item" },
                        "category": { "type": "STRING", "description": "The category of the item" }
                    },
                    "required": ["name", "category"]
                }
            }
        }
    })
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// 先頭候補のテキストパートを連結
    fn text(&self) -> String {
        self.candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
