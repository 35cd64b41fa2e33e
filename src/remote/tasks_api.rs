use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::model::task::TaskRecord;

const TASKS_API: &str = "https://tasks.googleapis.com/tasks/v1";
/// Provider page cap; one page is plenty for a personal list.
const MAX_RESULTS: &str = "100";

/// Error type for listing tasks. Shown as a banner on the task surface;
/// previously fetched data is always retained.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),
    #[error("task list request returned HTTP {status}: {detail}")]
    Http { status: u16, detail: String },
    #[error("could not decode the task list response: {0}")]
    Decode(String),
}

/// Lists the flat task records of one remote task list.
pub trait RemoteTaskSource: Send + Sync {
    fn list(&self, access_token: &str) -> Result<Vec<TaskRecord>, RemoteError>;
}

#[derive(Deserialize)]
struct TaskListEnvelope {
    #[serde(default)]
    items: Option<Vec<TaskRecord>>,
}

/// Google Tasks v1 over HTTPS.
pub struct GoogleTasksSource {
    http: Client,
    tasklist: String,
}

impl GoogleTasksSource {
    pub fn new(tasklist: String) -> Self {
        GoogleTasksSource {
            http: Client::new(),
            tasklist,
        }
    }
}

impl RemoteTaskSource for GoogleTasksSource {
    fn list(&self, access_token: &str) -> Result<Vec<TaskRecord>, RemoteError> {
        let url = format!("{TASKS_API}/lists/{}/tasks", self.tasklist);
        let resp = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .query(&[
                ("showCompleted", "true"),
                ("showHidden", "true"),
                ("maxResults", MAX_RESULTS),
            ])
            .send()
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let detail = summarize(&resp.text().unwrap_or_default());
            return Err(RemoteError::Http { status, detail });
        }
        let envelope: TaskListEnvelope =
            resp.json().map_err(|e| RemoteError::Decode(e.to_string()))?;
        let items = envelope.items.unwrap_or_default();
        debug!(count = items.len(), "listed remote tasks");
        Ok(items)
    }
}

/// One line, bounded length, for error bodies headed to a banner.
fn summarize(body: &str) -> String {
    let flat: String = body
        .trim()
        .replace(['\n', '\r'], " ")
        .chars()
        .take(200)
        .collect();
    if flat.is_empty() {
        "(empty body)".to_string()
    } else {
        flat
    }
}
