use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::auth::authorizer::{Authorizer, RestoreError};
use crate::auth::credential::Credential;
use crate::auth::store::CredentialStore;
use crate::model::task::TaskNode;
use crate::model::tree::build_tree;
use crate::remote::tasks_api::{RemoteError, RemoteTaskSource};

/// What asked for the refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Boot,
    Manual,
    Focus,
}

/// One fully built tree with the time its fetch completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeSnapshot {
    pub roots: Vec<TaskNode>,
    pub last_updated: DateTime<Utc>,
}

/// Published refresh state: the last known-good tree plus the transient
/// refreshing/error flags. Written only by the controller, read by the
/// render layer.
#[derive(Debug, Clone, Default)]
pub struct RefreshView {
    snapshot: Option<Arc<TreeSnapshot>>,
    refreshing: bool,
    error: Option<String>,
}

impl RefreshView {
    pub fn snapshot(&self) -> Option<&Arc<TreeSnapshot>> {
        self.snapshot.as_ref()
    }

    pub fn refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True while the first-ever fetch is pending: there is no stale data
    /// to show, only "no data yet".
    pub fn first_load(&self) -> bool {
        self.snapshot.is_none() && self.refreshing
    }
}

/// Outcomes the shell reacts to beyond re-reading the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshEvent {
    /// A new tree was swapped in.
    Published,
    /// The fetch failed; the prior tree is untouched.
    Failed,
    /// The worker renewed the credential; the session should adopt it.
    Renewed(Credential),
    /// Renewal was rejected; the session is over.
    SessionExpired(String),
}

enum Outcome {
    Finished {
        result: Result<Vec<TaskNode>, RemoteError>,
        renewed: Option<Credential>,
        finished_at: DateTime<Utc>,
    },
    Expired(String),
}

struct Completion {
    generation: u64,
    outcome: Outcome,
}

/// Drives "list remote tasks → rebuild tree → publish" under a
/// stale-while-revalidate policy: the previously published tree stays
/// visible while a refresh runs and is retained verbatim when one fails.
pub struct RefreshController {
    source: Arc<dyn RemoteTaskSource>,
    authorizer: Arc<dyn Authorizer>,
    store: Arc<dyn CredentialStore>,
    view: RefreshView,
    in_flight: bool,
    /// Bumped by `reset()`; completions from older generations are dropped.
    generation: u64,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
}

impl RefreshController {
    pub fn new(
        source: Arc<dyn RemoteTaskSource>,
        authorizer: Arc<dyn Authorizer>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        RefreshController {
            source,
            authorizer,
            store,
            view: RefreshView::default(),
            in_flight: false,
            generation: 0,
            tx,
            rx,
        }
    }

    pub fn view(&self) -> &RefreshView {
        &self.view
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Start a refresh with the session's current credential. A trigger
    /// that arrives while a fetch is outstanding coalesces with it; there
    /// is never more than one outstanding fetch.
    pub fn refresh(&mut self, trigger: RefreshTrigger, credential: &Credential) {
        if self.in_flight {
            debug!(?trigger, "refresh already in flight, coalescing");
            return;
        }
        debug!(?trigger, "refresh started");
        self.in_flight = true;
        self.view.refreshing = true;
        self.view.error = None;

        let credential = credential.clone();
        let source = self.source.clone();
        let authorizer = self.authorizer.clone();
        let store = self.store.clone();
        let generation = self.generation;
        let tx = self.tx.clone();
        thread::spawn(move || {
            let outcome = run_refresh(&credential, &*source, &*authorizer, &*store);
            let _ = tx.send(Completion {
                generation,
                outcome,
            });
        });
    }

    /// Drop all published state (sign-out). A worker that is still running
    /// belongs to the old generation and its completion will be ignored.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.in_flight = false;
        self.view = RefreshView::default();
    }

    /// Drain worker completions and apply them. Called once per tick on
    /// the UI thread; the tree swap is a single atomic step.
    pub fn poll(&mut self) -> Vec<RefreshEvent> {
        let mut events = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            if completion.generation != self.generation {
                debug!("dropping completion from a superseded session");
                continue;
            }
            self.in_flight = false;
            self.view.refreshing = false;
            match completion.outcome {
                Outcome::Finished {
                    result: Ok(roots),
                    renewed,
                    finished_at,
                } => {
                    if let Some(credential) = renewed {
                        events.push(RefreshEvent::Renewed(credential));
                    }
                    // atomic swap; the old tree stays alive behind its Arc
                    // until the last reader drops it
                    self.view.snapshot = Some(Arc::new(TreeSnapshot {
                        roots,
                        last_updated: finished_at,
                    }));
                    self.view.error = None;
                    events.push(RefreshEvent::Published);
                }
                Outcome::Finished {
                    result: Err(err),
                    renewed,
                    ..
                } => {
                    if let Some(credential) = renewed {
                        events.push(RefreshEvent::Renewed(credential));
                    }
                    // the prior tree is retained verbatim; only the error
                    // surfaces
                    warn!(error = %err, "refresh failed, keeping last tree");
                    self.view.error = Some(err.to_string());
                    events.push(RefreshEvent::Failed);
                }
                Outcome::Expired(reason) => {
                    events.push(RefreshEvent::SessionExpired(reason));
                }
            }
        }
        events
    }
}

/// The worker pipeline: renew an expiring token if needed, list, build.
/// Runs off the UI thread; reports exactly one outcome.
fn run_refresh(
    credential: &Credential,
    source: &dyn RemoteTaskSource,
    authorizer: &dyn Authorizer,
    store: &dyn CredentialStore,
) -> Outcome {
    let mut renewed = None;
    let mut active = credential.clone();
    if active.needs_renewal(Utc::now()) {
        match authorizer.restore_silently(&active) {
            Ok(fresh) => {
                if let Err(e) = store.save(&fresh) {
                    warn!(error = %e, "could not persist renewed credential");
                }
                active = fresh.clone();
                renewed = Some(fresh);
            }
            Err(RestoreError::Network(e)) => {
                // transient; surfaces like any other failed fetch
                return Outcome::Finished {
                    result: Err(RemoteError::Network(e)),
                    renewed: None,
                    finished_at: Utc::now(),
                };
            }
            Err(RestoreError::NoSession) => {
                return Outcome::Expired("session can no longer be renewed".into());
            }
            Err(RestoreError::Rejected(reason)) => return Outcome::Expired(reason),
        }
    }
    let result = source.list(&active.access_token).map(build_tree);
    Outcome::Finished {
        result,
        renewed,
        finished_at: Utc::now(),
    }
}
