use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Events sent from the credential file watcher to the TUI event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialEvent {
    /// The credential file was created or rewritten on disk.
    Changed,
    /// The credential file was removed.
    Removed,
}

/// Watches the config directory for credential changes made by another
/// process (`sg signin` / `sg signout` while the TUI is open).
pub struct CredentialWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<CredentialEvent>,
}

impl CredentialWatcher {
    /// Start watching. `credential_file` is the exact path to react to;
    /// everything else in the directory is ignored.
    pub fn start(config_dir: &Path, credential_file: PathBuf) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(e) => e,
                    Err(_) => return,
                };

                let kind = match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) => CredentialEvent::Changed,
                    EventKind::Remove(_) => CredentialEvent::Removed,
                    _ => return,
                };

                if event.paths.iter().any(|p| p == &credential_file) {
                    let _ = tx.send(kind);
                }
            },
            Config::default(),
        )?;

        watcher.watch(config_dir, RecursiveMode::NonRecursive)?;
        Ok(CredentialWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Non-blocking poll for pending events.
    /// Returns all queued events (may be empty).
    pub fn poll(&self) -> Vec<CredentialEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            events.push(evt);
        }
        events
    }
}
