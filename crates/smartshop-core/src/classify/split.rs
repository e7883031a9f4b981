//! Local Splitter
//!
//! ネットワークを使わない決定的な分割。分類器のフォールバックと
//! "simple add" の両方で使う。

use crate::item::ParsedItem;

/// カンマのみで分割（simple add用）
pub fn split_simple(text: &str) -> Vec<String> {
    split_tokens(text, &[','])
}

/// カンマまたは改行で分割（フォールバック用）
pub fn split_smart(text: &str) -> Vec<String> {
    split_tokens(text, &[',', '\n'])
}

/// `split_smart` の結果に同一カテゴリを付与
pub fn fallback_items(text: &str, category: &str) -> Vec<ParsedItem> {
    split_smart(text)
        .into_iter()
        .map(|name| ParsedItem::new(name, category))
        .collect()
}

fn split_tokens(text: &str, separators: &[char]) -> Vec<String> {
    text.split(separators)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
