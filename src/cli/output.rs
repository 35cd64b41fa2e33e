use serde::Serialize;

use crate::model::task::{TaskNode, TaskStatus};
use crate::model::tree::count_nodes;
use crate::util::time::format_due;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct TaskTreeJson {
    pub count: usize,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct StatusJson {
    pub config_path: String,
    pub configured: bool,
    pub signed_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token_expires_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn node_to_json(node: &TaskNode) -> TaskJson {
    TaskJson {
        id: node.id.clone(),
        title: node.title.clone(),
        status: node.status,
        due: node.due.clone(),
        notes: if node.notes.is_empty() {
            None
        } else {
            Some(node.notes.clone())
        },
        subtasks: node.children.iter().map(node_to_json).collect(),
    }
}

pub fn tree_to_json(roots: &[TaskNode]) -> TaskTreeJson {
    TaskTreeJson {
        count: count_nodes(roots),
        tasks: roots.iter().map(node_to_json).collect(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Format a single task as a one-line summary
pub fn format_task_line(node: &TaskNode) -> String {
    let due = node
        .due
        .as_deref()
        .map(|raw| format!("  ({})", format_due(raw)))
        .unwrap_or_default();
    format!("[{}] {}{}", node.status.checkbox_char(), node.title, due)
}

/// Print the tree indented two spaces per level
pub fn print_tree(roots: &[TaskNode]) {
    fn walk(nodes: &[TaskNode], depth: usize) {
        for node in nodes {
            println!("{}{}", "  ".repeat(depth), format_task_line(node));
            walk(&node.children, depth + 1);
        }
    }
    if roots.is_empty() {
        println!("No tasks.");
    } else {
        walk(roots, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskRecord;

    fn node(id: &str, title: &str, status: Option<&str>) -> TaskNode {
        TaskNode::from_record(TaskRecord {
            title: Some(title.to_string()),
            status: status.map(String::from),
            ..TaskRecord::new(id)
        })
    }

    #[test]
    fn format_open_task() {
        assert_eq!(format_task_line(&node("a", "Buy milk", None)), "[ ] Buy milk");
    }

    #[test]
    fn format_completed_task_with_due() {
        let mut n = node("a", "Ship it", Some("completed"));
        n.due = Some("2025-03-04T00:00:00Z".into());
        assert_eq!(format_task_line(&n), "[x] Ship it  (Tue Mar 4)");
    }

    #[test]
    fn json_skips_empty_fields() {
        let tree = tree_to_json(&[node("a", "Solo", None)]);
        let text = serde_json::to_string(&tree).unwrap();
        assert_eq!(
            text,
            r#"{"count":1,"tasks":[{"id":"a","title":"Solo","status":"needsAction"}]}"#
        );
    }
}
