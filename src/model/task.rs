use serde::{Deserialize, Serialize};

/// Placeholder title for records the provider sends without one.
pub const UNTITLED: &str = "(untitled)";

/// Task completion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    NeedsAction,
    Completed,
}

impl TaskStatus {
    /// Parse the wire value. Anything that is not "completed" — including
    /// absence and unknown values — counts as needing action.
    pub fn from_wire(raw: Option<&str>) -> TaskStatus {
        match raw {
            Some("completed") => TaskStatus::Completed,
            _ => TaskStatus::NeedsAction,
        }
    }

    /// The character used inside the checkbox `[ ]`
    pub fn checkbox_char(self) -> char {
        match self {
            TaskStatus::NeedsAction => ' ',
            TaskStatus::Completed => 'x',
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::NeedsAction
    }
}

/// A task exactly as received from the provider. A refresh replaces the
/// whole snapshot; records are never merged across fetches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// RFC 3339 due stamp, passed through verbatim
    #[serde(default)]
    pub due: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Provider-assigned sort key; lexicographic order among siblings
    #[serde(default)]
    pub position: Option<String>,
    /// Parent task id; absent for top-level tasks
    #[serde(default)]
    pub parent: Option<String>,
}

impl TaskRecord {
    /// A record with only an id, everything else absent.
    pub fn new(id: impl Into<String>) -> Self {
        TaskRecord {
            id: id.into(),
            title: None,
            notes: None,
            due: None,
            status: None,
            position: None,
            parent: None,
        }
    }
}

/// A normalized task with its ordered children. Built fresh on every
/// successful refresh and never mutated in place afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskNode {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    pub status: TaskStatus,
    #[serde(skip)]
    pub position: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TaskNode>,
}

impl TaskNode {
    /// Normalize a raw record: placeholder title, empty notes/position,
    /// needsAction status. Children start empty.
    pub fn from_record(record: TaskRecord) -> Self {
        let title = match record.title {
            Some(title) if !title.is_empty() => title,
            _ => UNTITLED.to_string(),
        };
        TaskNode {
            id: record.id,
            title,
            notes: record.notes.unwrap_or_default(),
            due: record.due,
            status: TaskStatus::from_wire(record.status.as_deref()),
            position: record.position.unwrap_or_default(),
            children: Vec::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}
