//! Domain entities: core data structures

use std::fmt;

use serde::{Deserialize, Serialize};

/// Element contract supplied by callers.
///
/// Ids are expected to be unique; a `None` parent marks a root.
/// The label is display text and the search key.
pub trait TreeElement {
    fn element_id(&self) -> i64;
    fn parent_id(&self) -> Option<i64>;
    fn label(&self) -> &str;
}

/// Plain element record, as read from a catalog file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BubbleItem {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<i64>,
    pub label: String,
}

impl BubbleItem {
    pub fn root(id: i64, label: impl Into<String>) -> Self {
        Self {
            id,
            parent: None,
            label: label.into(),
        }
    }

    pub fn child(id: i64, parent: i64, label: impl Into<String>) -> Self {
        Self {
            id,
            parent: Some(parent),
            label: label.into(),
        }
    }
}

impl TreeElement for BubbleItem {
    fn element_id(&self) -> i64 {
        self.id
    }

    fn parent_id(&self) -> Option<i64> {
        self.parent
    }

    fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for BubbleItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Expand `~`, `$VAR` and `${VAR}` in a path string.
///
/// Falls back to the input unchanged if a variable is undefined.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
