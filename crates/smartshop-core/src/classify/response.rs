//! Prompt and Response Handling
//!
//! リモート分類器への指示文の生成と、応答テキストのパース。
//! バックエンド（Gemini / Claude CLI）間で共通。

use serde::Deserialize;

use crate::error::{Result, ShopError};
use crate::item::ParsedItem;

/// 分類器への指示文を生成
pub fn build_prompt(input: &str) -> String {
    format!(
        r#"You are a helpful shopping assistant. Analyze the following shopping list input. It might be a raw text list, a recipe name, or a sentence describing what to buy.

Extract individual items and assign them a short, standard supermarket category (e.g., "Produce", "Dairy", "Meat", "Pantry", "Household", "Beverages").
If the input is a recipe name (e.g., "Lasagna"), generate the ingredients needed for it.

## Output Format

Output a JSON array where each element has:
- "name": the name of the item
- "category": the category of the item

Example:
```json
[
  {{"name": "Milk", "category": "Dairy"}},
  {{"name": "Apples", "category": "Produce"}}
]
```

Output ONLY the JSON array, no other text.

Input: "{input}""#
    )
}

#[derive(Deserialize)]
struct RawItem {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

/// 応答テキストを `(name, category)` 列にパース
///
/// - 空（空白のみ）の応答は空の列
/// - JSON配列として読めない応答はエラー（呼び出し側でフォールバック）
/// - `name` / `category` が欠けている、または空のレコードは捨てる
pub fn parse_items(output: &str) -> Result<Vec<ParsedItem>> {
    if output.trim().is_empty() {
        return Ok(Vec::new());
    }

    let json_str = extract_json_from_output(output);
    let raw: Vec<RawItem> = serde_json::from_str(json_str).map_err(|e| {
        ShopError::classifier(format!("Failed to parse classifier output as JSON: {}", e))
    })?;

    Ok(raw
        .into_iter()
        .filter_map(|item| {
            let name = item.name?.trim().to_string();
            let category = item.category?.trim().to_string();
            if name.is_empty() || category.is_empty() {
                None
            } else {
                Some(ParsedItem { name, category })
            }
        })
        .collect())
}

/// LLM出力からJSON部分を抽出
pub(crate) fn extract_json_from_output(output: &str) -> &str {
    if let Some(start) = output.find("```json") {
        let start = start + 7;
        if let Some(end) = output[start..].find("```") {
            return output[start..start + end].trim();
        }
    }
    if let Some(start) = output.find("```") {
        let start = start + 3;
        if let Some(end) = output[start..].find("```") {
            return output[start..start + end].trim();
        }
    }
    if let Some(start) = output.find('[') {
        if let Some(end) = output.rfind(']') {
            if end > start {
                return &output[start..=end];
            }
        }
    }
    output.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_input_and_instructions() {
        let prompt = build_prompt("Lasagna");
        assert!(prompt.contains("Input: \"Lasagna\""));
        assert!(prompt.contains("recipe"));
        assert!(prompt.contains("\"category\""));
    }

    #[test]
    fn test_parse_plain_array() {
        let items =
            parse_items(r#"[{"name":"Milk","category":"Dairy"},{"name":"Apples","category":"Produce"}]"#)
                .unwrap();
        assert_eq!(
            items,
            vec![
                ParsedItem::new("Milk", "Dairy"),
                ParsedItem::new("Apples", "Produce"),
            ]
        );
    }

    #[test]
    fn test_parse_fenced_output() {
        let output = "Here you go:\n```json\n[{\"name\": \"Pasta\", \"category\": \"Pantry\"}]\n```\n";
        let items = parse_items(output).unwrap();
        assert_eq!(items, vec![ParsedItem::new("Pasta", "Pantry")]);
    }

    #[test]
    fn test_parse_empty_output_is_empty() {
        assert!(parse_items("").unwrap().is_empty());
        assert!(parse_items("  \n").unwrap().is_empty());
        assert!(parse_items("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed_output_is_error() {
        assert!(parse_items("not json at all").is_err());
        assert!(parse_items(r#"{"name":"Milk"}"#).is_err());
        assert!(parse_items("[1, 2]").is_err());
    }

    #[test]
    fn test_parse_drops_invalid_records() {
        let output = r#"[
            {"name": " Eggs ", "category": " Dairy "},
            {"name": "", "category": "Dairy"},
            {"name": "Salt"},
            {"category": "Pantry"},
            {"name": "Bread", "category": "   "}
        ]"#;
        let items = parse_items(output).unwrap();
        assert_eq!(items, vec![ParsedItem::new("Eggs", "Dairy")]);
    }
}
