use serde::{Deserialize, Serialize};

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// OAuth client id of a "Desktop app" client
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    /// Space-separated OAuth scopes requested at sign-in
    #[serde(default = "default_scopes")]
    pub scopes: String,
    /// Task list to display; "@default" is the user's primary list
    #[serde(default = "default_tasklist")]
    pub tasklist: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        GoogleConfig {
            client_id: String::new(),
            client_secret: String::new(),
            scopes: default_scopes(),
            tasklist: default_tasklist(),
        }
    }
}

impl GoogleConfig {
    /// True when both OAuth client fields are filled in.
    pub fn is_configured(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.trim().is_empty()
    }
}

fn default_scopes() -> String {
    "https://www.googleapis.com/auth/tasks".to_string()
}

fn default_tasklist() -> String {
    "@default".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Minimum gap between focus-triggered refreshes; 0 fires on every focus
    #[serde(default = "default_focus_debounce_ms")]
    pub focus_debounce_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig {
            focus_debounce_ms: default_focus_debounce_ms(),
        }
    }
}

fn default_focus_debounce_ms() -> u64 {
    500
}

/// Optional hex color overrides for the TUI, e.g. `background = "#0B1016"`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub highlight: Option<String>,
    #[serde(default)]
    pub dim: Option<String>,
    #[serde(default)]
    pub done: Option<String>,
    #[serde(default)]
    pub due: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
