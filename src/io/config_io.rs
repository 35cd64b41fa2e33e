use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::model::config::AppConfig;

/// Error type for configuration I/O
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not locate a config directory for this platform")]
    NoConfigDir,
    #[error("no config found at {0}; run `sg init` first")]
    Missing(PathBuf),
    #[error("config already exists at {0} (use --force to overwrite)")]
    AlreadyExists(PathBuf),
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Starter config written by `sg init`.
pub const CONFIG_TEMPLATE: &str = r##"# sprig configuration
#
# Create an OAuth client of type "Desktop app" in the Google Cloud console,
# enable the Tasks API for the project, and paste the client credentials
# here. Then run `sg signin`.

[google]
client_id = ""
client_secret = ""
# Space-separated OAuth scopes requested at sign-in.
scopes = "https://www.googleapis.com/auth/tasks"
# Task list to display; "@default" is your primary list.
tasklist = "@default"

[refresh]
# Minimum milliseconds between focus-triggered refreshes. 0 refreshes on
# every focus.
focus_debounce_ms = 500

[ui]
# Optional hex color overrides, e.g.
# background = "#0B1016"
# highlight = "#4CA6FF"
"##;

/// Resolve the config directory: the `-C` override when given, else the
/// platform config dir for sprig.
pub fn config_dir(override_dir: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = override_dir {
        return Ok(dir.to_path_buf());
    }
    ProjectDirs::from("", "", "sprig")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or(ConfigError::NoConfigDir)
}

pub fn config_path(dir: &Path) -> PathBuf {
    dir.join("config.toml")
}

pub fn credential_path(dir: &Path) -> PathBuf {
    dir.join("credential.json")
}

pub fn state_path(dir: &Path) -> PathBuf {
    dir.join(".state.json")
}

/// Load config.toml from the given directory.
pub fn load_config(dir: &Path) -> Result<AppConfig, ConfigError> {
    let path = config_path(dir);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::Missing(path));
        }
        Err(e) => return Err(ConfigError::Read { path, source: e }),
    };
    Ok(toml::from_str(&text)?)
}

/// Write the starter config.toml. Refuses to overwrite unless forced.
pub fn init_config(dir: &Path, force: bool) -> Result<PathBuf, ConfigError> {
    let path = config_path(dir);
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path));
    }
    fs::create_dir_all(dir).map_err(|e| ConfigError::Write {
        path: dir.to_path_buf(),
        source: e,
    })?;
    fs::write(&path, CONFIG_TEMPLATE).map_err(|e| ConfigError::Write {
        path: path.clone(),
        source: e,
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn override_dir_wins() {
        let dir = config_dir(Some(Path::new("/tmp/elsewhere"))).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/elsewhere"));
    }

    #[test]
    fn init_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        init_config(dir.path(), false).unwrap();
        let config = load_config(dir.path()).unwrap();
        assert!(!config.google.is_configured());
        assert_eq!(config.google.tasklist, "@default");
        assert_eq!(config.refresh.focus_debounce_ms, 500);
    }

    #[test]
    fn load_missing_names_the_path() {
        let dir = TempDir::new().unwrap();
        match load_config(dir.path()) {
            Err(ConfigError::Missing(path)) => assert!(path.ends_with("config.toml")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        init_config(dir.path(), false).unwrap();
        assert!(matches!(
            init_config(dir.path(), false),
            Err(ConfigError::AlreadyExists(_))
        ));
    }

    #[test]
    fn init_force_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = init_config(dir.path(), false).unwrap();
        fs::write(&path, "[google]\nclient_id = \"x\"\n").unwrap();
        init_config(dir.path(), true).unwrap();
        let config = load_config(dir.path()).unwrap();
        assert!(config.google.client_id.is_empty());
    }

    #[test]
    fn malformed_config_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        fs::write(config_path(dir.path()), "not toml [[[").unwrap();
        assert!(matches!(
            load_config(dir.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
