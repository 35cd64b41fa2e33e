use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::io::config_io::state_path;

/// Persisted TUI state (written to .state.json). Best-effort on both ends:
/// an unreadable file is ignored, a failed write only loses cosmetics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiState {
    /// Cursor index into the flat visible list
    #[serde(default)]
    pub cursor: usize,
    /// Scroll offset (first visible row)
    #[serde(default)]
    pub scroll_offset: usize,
    /// Task ids whose children are hidden
    #[serde(default)]
    pub collapsed: HashSet<String>,
    /// Last search pattern
    #[serde(default)]
    pub last_search: Option<String>,
}

/// Read .state.json from the config directory
pub fn read_ui_state(config_dir: &Path) -> Option<UiState> {
    let content = fs::read_to_string(state_path(config_dir)).ok()?;
    serde_json::from_str(&content).ok()
}

/// Write .state.json to the config directory
pub fn write_ui_state(config_dir: &Path, state: &UiState) -> Result<(), std::io::Error> {
    let content = serde_json::to_string_pretty(state)?;
    fs::write(state_path(config_dir), content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_and_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut state = UiState {
            cursor: 5,
            scroll_offset: 10,
            last_search: Some("pattern".into()),
            ..Default::default()
        };
        state.collapsed.insert("task-1".into());

        write_ui_state(dir.path(), &state).unwrap();
        let loaded = read_ui_state(dir.path()).unwrap();

        assert_eq!(loaded.cursor, 5);
        assert_eq!(loaded.scroll_offset, 10);
        assert_eq!(loaded.last_search, Some("pattern".into()));
        assert!(loaded.collapsed.contains("task-1"));
    }

    #[test]
    fn read_missing_file_returns_none() {
        let dir = TempDir::new().unwrap();
        assert!(read_ui_state(dir.path()).is_none());
    }

    #[test]
    fn read_malformed_json_returns_none() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".state.json"), "not json {{{").unwrap();
        assert!(read_ui_state(dir.path()).is_none());
    }

    #[test]
    fn serde_defaults_on_empty_object() {
        let state: UiState = serde_json::from_str("{}").unwrap();
        assert_eq!(state.cursor, 0);
        assert_eq!(state.scroll_offset, 0);
        assert!(state.collapsed.is_empty());
        assert!(state.last_search.is_none());
    }
}
