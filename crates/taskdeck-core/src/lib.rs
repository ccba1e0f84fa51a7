//! Domain types for taskdeck: folders contain lists, lists contain tasks.

/// Identifier types.
pub mod id;

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::id::{FolderId, ListId, TaskId};

/// Top-level grouping entity containing lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Identifier (`fldr<n>`).
    pub id: FolderId,
    /// Display name.
    pub name: String,
}

/// Named collection of tasks, owned by exactly one folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    /// Identifier (`list<n>`).
    pub id: ListId,
    /// Owning folder.
    pub folder_id: FolderId,
    /// Display name.
    pub content: String,
}

/// Leaf work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Identifier (`task<n>`).
    pub id: TaskId,
    /// Owning list.
    pub list_id: ListId,
    /// Required title.
    pub title: String,
    /// Optional free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Completion state.
    pub done: bool,
    /// Optional tags. The UI layer caps a task at 5 unique tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Priority level.
    pub priority: Priority,
}

/// Task priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Can wait.
    Low,
    /// The default for new tasks.
    #[default]
    Medium,
    /// Needs attention first.
    High,
}

impl Priority {
    /// String representation used in the persisted records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure to parse a [`Priority`] from its string form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown priority {0:?}, expected low, medium or high")]
pub struct ParsePriorityError(pub String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(ParsePriorityError(other.to_owned())),
        }
    }
}
