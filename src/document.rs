//! Document records stored in the index sidecar and the ranked hits built from them.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    // Labelled title line of a contest announcement; the value runs until the next `[label]` line.
    static ref TITLE_FIELD: Regex =
        Regex::new(r"(?s)\[공모전명\]:\s*(.+?)(?:\n\[|\z)").expect("title pattern compiles");
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub chunk: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Document {
            id: id.into(),
            text: text.into(),
            path: String::new(),
            chunk: 0,
            title: None,
        }
    }

    /// Structured title if present, otherwise whatever the labelled field in `text` holds.
    pub fn title_or_extract(&self) -> Option<String> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .or_else(|| extract_title(&self.text))
    }
}

/// Fallback parser for legacy announcement text: `[공모전명]: <title>`.
pub fn extract_title(text: &str) -> Option<String> {
    TITLE_FIELD
        .captures(text.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    #[serde(flatten)]
    pub document: Document,
    pub score: f32,
}
