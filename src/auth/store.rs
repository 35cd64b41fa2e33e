use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::auth::credential::Credential;

/// Error type for credential persistence
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
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
    #[error("credential JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persists the session credential across process restarts.
pub trait CredentialStore: Send + Sync {
    /// The stored credential, or None when no session has been saved.
    fn load(&self) -> Result<Option<Credential>, StoreError>;
    fn save(&self, credential: &Credential) -> Result<(), StoreError>;
    /// Removing an absent credential is not an error.
    fn clear(&self) -> Result<(), StoreError>;
}

/// File-backed store: one JSON document in the config directory, written
/// to a temp file and renamed into place so a crash mid-write cannot leave
/// a torn credential behind.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        FileCredentialStore { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credential>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        let dir = self.path.parent().unwrap_or(Path::new("."));
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        fs::create_dir_all(dir).map_err(write_err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = tmp
                .as_file()
                .set_permissions(fs::Permissions::from_mode(0o600));
        }
        serde_json::to_writer_pretty(&mut tmp, credential)?;
        tmp.persist(&self.path).map_err(|e| StoreError::Write {
            path: self.path.clone(),
            source: e.error,
        })?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Write {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> FileCredentialStore {
        FileCredentialStore::new(dir.path().join("credential.json"))
    }

    fn credential() -> Credential {
        Credential {
            access_token: "access".into(),
            refresh_token: Some("refresh".into()),
            expires_at: None,
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&credential()).unwrap();
        assert_eq!(store.load().unwrap(), Some(credential()));
    }

    #[test]
    fn load_absent_returns_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(store_in(&dir).load().unwrap(), None);
    }

    #[test]
    fn load_corrupt_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "not json {{{").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Json(_))));
    }

    #[test]
    fn clear_removes_the_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&credential()).unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn clear_absent_is_ok() {
        let dir = TempDir::new().unwrap();
        store_in(&dir).clear().unwrap();
    }

    #[test]
    fn save_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested/deeper/credential.json"));
        store.save(&credential()).unwrap();
        assert_eq!(store.load().unwrap(), Some(credential()));
    }
}
