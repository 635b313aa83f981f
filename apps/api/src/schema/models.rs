use serde::{Deserialize, Serialize};

/// The authoritative structural document describing how a CV is partitioned.
///
/// The schema is the single source of truth for structure; the UI section
/// tree is a derived, rebuildable projection of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Free-form version tag, passed through unchanged across edits unless a
    /// candidate explicitly sets a non-empty one.
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub sections: Vec<SectionNode>,
}

/// A named container node, rendered as a collapsible section in the UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

/// A leaf or group entry in the schema's `sections` array.
///
/// `start`/`end` are anchor snippets used by the external parser to slice
/// raw text. They are opaque here and must survive merges unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionNode {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// A materialized, content-bearing section as the UI consumes it.
///
/// `text` and `constraints` are the only fields that survive a schema
/// rebuild; `optimized_text`, `optimizing` and `error` are transient edit
/// state owned by the UI layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiSection {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub constraints: String,
    #[serde(default)]
    pub optimized_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Schema {
    /// True when the document describes nothing at all. Callers treat this
    /// as "no usable schema" rather than an error.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.sections.is_empty()
    }
}
