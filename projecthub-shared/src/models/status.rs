/// Status and priority enumerations shared by projects and tasks
///
/// Both are stored as snake_case text (guarded by CHECK constraints in the
/// schema) and serialized the same way in JSON. Unknown values fail to
/// deserialize, so they never reach the database.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a project or task
///
/// Any status may be set from any other; there is no transition graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Not started yet (default)
    #[default]
    Pending,

    /// Work under way
    InProgress,

    /// Done
    Completed,

    /// Abandoned
    Cancelled,
}

impl ItemStatus {
    /// Converts status to its stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::InProgress => "in_progress",
            ItemStatus::Completed => "completed",
            ItemStatus::Cancelled => "cancelled",
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,

    /// Default priority
    #[default]
    Medium,

    High,
}

impl TaskPriority {
    /// Converts priority to its stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}
