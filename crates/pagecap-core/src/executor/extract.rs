//! DOM extraction after capture

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What to pull out of the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomExtract {
    /// Serialized document HTML
    Html,
    /// Visible text of the body
    Text,
    /// Compact element outline
    Tree,
}

impl DomExtract {
    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Text => "text",
            Self::Tree => "tree",
        }
    }

    /// Parse a wire name (case-insensitive)
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "html" | "dom" => Some(Self::Html),
            "text" => Some(Self::Text),
            "tree" | "outline" => Some(Self::Tree),
            _ => None,
        }
    }

    /// Function evaluated in the page
    pub(crate) fn script(&self) -> &'static str {
        match self {
            Self::Html => "() => document.documentElement ? document.documentElement.outerHTML : ''",
            Self::Text => "() => document.body ? document.body.innerText : ''",
            Self::Tree => {
                "() => { \
                 const walk = (el, depth) => { \
                   const node = { tag: el.tagName.toLowerCase() }; \
                   if (el.id) node.id = el.id; \
                   const cls = typeof el.className === 'string' ? el.className.trim() : ''; \
                   if (cls) node.class = cls; \
                   if (depth < 6 && el.children.length) { \
                     node.children = Array.from(el.children).slice(0, 50).map(c => walk(c, depth + 1)); \
                   } \
                   return node; \
                 }; \
                 return document.body ? walk(document.body, 0) : null; }"
            }
        }
    }
}

/// One extracted block
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedBlock {
    /// What was extracted
    pub kind: DomExtract,
    /// Content, cut at the byte ceiling
    pub content: String,
    /// Whether `content` was cut
    pub truncated: bool,
    /// Size before truncation
    pub original_bytes: usize,
}

impl ExtractedBlock {
    /// Build a block from an evaluate result
    pub(crate) fn from_value(kind: DomExtract, value: Value, limit_bytes: usize) -> Self {
        let full = match value {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => serde_json::to_string_pretty(&other).unwrap_or_default(),
        };
        let original_bytes = full.len();
        let (content, truncated) = truncate_utf8(full, limit_bytes);
        Self {
            kind,
            content,
            truncated,
            original_bytes,
        }
    }
}

/// Cut a string to at most `limit` bytes on a char boundary
#[must_use]
pub fn truncate_utf8(mut text: String, limit: usize) -> (String, bool) {
    if text.len() <= limit {
        return (text, false);
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
    (text, true)
}
