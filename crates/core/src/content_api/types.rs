//! Response shapes of the content API.

use serde::Deserialize;
use serde_json::Value;

/// Response of `/bibles/filesets/{id}/{book}/{chapter}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChapterResponse {
    #[serde(default)]
    pub data: Vec<ChapterItem>,
}

/// One item of a chapter response: a media file or a verse.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChapterItem {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub verse_start: Option<Value>,
    #[serde(default)]
    pub verse_text: Option<String>,
}

impl ChapterResponse {
    /// Media location of the first item.
    pub fn first_path(&self) -> Option<String> {
        self.data
            .first()
            .and_then(|item| item.path.clone())
            .filter(|p| !p.is_empty())
    }

    /// Non-empty verse texts joined by newlines.
    pub fn joined_text(&self) -> Option<String> {
        let verses: Vec<&str> = self
            .data
            .iter()
            .filter_map(|item| item.verse_text.as_deref())
            .filter(|t| !t.is_empty())
            .collect();
        if verses.is_empty() {
            None
        } else {
            Some(verses.join("\n"))
        }
    }
}

/// Extract the timing payload from a `/timestamps` response.
///
/// Responses carrying an `error` key, or an empty `data` array, have none.
pub fn timing_payload(response: Value) -> Option<Value> {
    let Value::Object(mut map) = response else {
        return None;
    };
    if map.contains_key("error") {
        return None;
    }
    match map.remove("data") {
        Some(Value::Array(items)) if !items.is_empty() => Some(Value::Array(items)),
        _ => None,
    }
}
