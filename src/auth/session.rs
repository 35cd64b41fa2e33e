use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::{debug, info, warn};

use crate::auth::authorizer::{AuthError, Authorizer, RestoreError};
use crate::auth::credential::Credential;
use crate::auth::store::CredentialStore;

/// Session lifecycle states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Boot-time silent restore is still pending.
    Booting,
    /// No session. `error` carries an inline sign-in failure, if any;
    /// a plain absent session shows no error at all.
    Unauthenticated { error: Option<String> },
    /// Interactive sign-in is waiting on the browser.
    Authenticating,
    Authenticated { credential: Credential },
}

/// Transitions the shell reacts to, in the order they were applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Silent restore produced a usable session.
    Restored,
    /// Boot restore found nothing; the sign-in surface should show.
    RestoreFailed,
    /// Interactive sign-in produced a usable session.
    SignedIn,
    /// Sign-in failed; the inline error is on the state.
    SignInFailed,
}

enum Completion {
    Restore(Result<Credential, RestoreError>),
    SignIn(Result<Credential, AuthError>),
}

/// Owns the in-memory session state machine. All I/O runs on short-lived
/// worker threads; completions are drained by `poll()` on the UI thread,
/// so every transition is a single atomic step.
pub struct SessionManager {
    state: SessionState,
    authorizer: Arc<dyn Authorizer>,
    store: Arc<dyn CredentialStore>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
}

impl SessionManager {
    pub fn new(authorizer: Arc<dyn Authorizer>, store: Arc<dyn CredentialStore>) -> Self {
        let (tx, rx) = mpsc::channel();
        SessionManager {
            state: SessionState::Booting,
            authorizer,
            store,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The published credential, read synchronously at refresh-start time.
    pub fn credential(&self) -> Option<&Credential> {
        match &self.state {
            SessionState::Authenticated { credential } => Some(credential),
            _ => None,
        }
    }

    /// Kick off the boot-time silent restore. Failure of any kind lands in
    /// `Unauthenticated` without a visible error: absence of a session is
    /// the default state, not an error condition.
    pub fn restore(&mut self) {
        self.state = SessionState::Booting;
        let authorizer = self.authorizer.clone();
        let store = self.store.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let _ = tx.send(Completion::Restore(restore_session(&*authorizer, &*store)));
        });
    }

    /// Start the interactive consent flow. Ignored unless unauthenticated.
    pub fn sign_in(&mut self) {
        if !matches!(self.state, SessionState::Unauthenticated { .. }) {
            return;
        }
        self.state = SessionState::Authenticating;
        let authorizer = self.authorizer.clone();
        let store = self.store.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let _ = tx.send(Completion::SignIn(interactive_sign_in(
                &*authorizer,
                &*store,
            )));
        });
    }

    /// Clear the session. The in-memory and persisted copies go in the same
    /// step on the UI thread; the remote revoke is fire-and-forget.
    pub fn sign_out(&mut self) {
        let previous = std::mem::replace(
            &mut self.state,
            SessionState::Unauthenticated { error: None },
        );
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "could not clear stored credential");
        }
        if let SessionState::Authenticated { credential } = previous {
            let authorizer = self.authorizer.clone();
            thread::spawn(move || authorizer.sign_out(&credential));
        }
        info!("signed out");
    }

    /// Adopt a credential the refresh worker renewed (already persisted).
    pub fn adopt_renewal(&mut self, credential: Credential) {
        if matches!(self.state, SessionState::Authenticated { .. }) {
            self.state = SessionState::Authenticated { credential };
        }
    }

    /// A mid-session renewal was rejected; the session is over.
    pub fn expire(&mut self, reason: &str) {
        warn!(reason, "session expired");
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "could not clear stored credential");
        }
        self.state = SessionState::Unauthenticated {
            error: Some(format!("Session expired: {reason}")),
        };
    }

    /// Drain worker completions and apply them. Called once per tick on the
    /// UI thread. A completion that no longer matches the current state
    /// (the user signed out mid-flight) is dropped.
    pub fn poll(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            match completion {
                Completion::Restore(Ok(credential)) => {
                    if matches!(self.state, SessionState::Booting) {
                        self.state = SessionState::Authenticated { credential };
                        events.push(SessionEvent::Restored);
                    }
                }
                Completion::Restore(Err(err)) => {
                    if matches!(self.state, SessionState::Booting) {
                        debug!(error = %err, "silent restore failed");
                        self.state = SessionState::Unauthenticated { error: None };
                        events.push(SessionEvent::RestoreFailed);
                    }
                }
                Completion::SignIn(Ok(credential)) => {
                    if matches!(self.state, SessionState::Authenticating) {
                        self.state = SessionState::Authenticated { credential };
                        events.push(SessionEvent::SignedIn);
                    }
                }
                Completion::SignIn(Err(err)) => {
                    if matches!(self.state, SessionState::Authenticating) {
                        self.state = SessionState::Unauthenticated {
                            error: Some(err.to_string()),
                        };
                        events.push(SessionEvent::SignInFailed);
                    }
                }
            }
        }
        events
    }
}

/// Silent restore: load the stored credential and renew it. The renewal is
/// persisted before it is returned, so a crash right after cannot lose a
/// freshly obtained session without also losing the in-memory copy.
pub fn restore_session(
    authorizer: &dyn Authorizer,
    store: &dyn CredentialStore,
) -> Result<Credential, RestoreError> {
    let stored = match store.load() {
        Ok(Some(credential)) => credential,
        Ok(None) => return Err(RestoreError::NoSession),
        Err(e) => {
            warn!(error = %e, "stored credential unreadable");
            return Err(RestoreError::NoSession);
        }
    };
    let renewed = authorizer.restore_silently(&stored)?;
    persist(store, &renewed);
    Ok(renewed)
}

/// Interactive sign-in, persisted before it is returned. A failed sign-in
/// leaves nothing partial behind: nothing is written until the authorizer
/// has produced a complete credential.
pub fn interactive_sign_in(
    authorizer: &dyn Authorizer,
    store: &dyn CredentialStore,
) -> Result<Credential, AuthError> {
    let credential = authorizer.sign_in()?;
    persist(store, &credential);
    Ok(credential)
}

fn persist(store: &dyn CredentialStore, credential: &Credential) {
    if let Err(e) = store.save(credential) {
        // the in-memory session still works for this run
        warn!(error = %e, "could not persist credential");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::StoreError;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    fn credential(token: &str) -> Credential {
        Credential {
            access_token: token.into(),
            refresh_token: Some("refresh".into()),
            expires_at: None,
        }
    }

    #[derive(Default)]
    struct FakeAuthorizer {
        sign_ins: Mutex<VecDeque<Result<Credential, AuthError>>>,
        restores: Mutex<VecDeque<Result<Credential, RestoreError>>>,
        revokes: AtomicUsize,
    }

    impl Authorizer for FakeAuthorizer {
        fn sign_in(&self) -> Result<Credential, AuthError> {
            self.sign_ins
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(AuthError::Cancelled))
        }

        fn restore_silently(&self, _stored: &Credential) -> Result<Credential, RestoreError> {
            self.restores
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(RestoreError::NoSession))
        }

        fn sign_out(&self, _credential: &Credential) {
            self.revokes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct FakeStore {
        stored: Mutex<Option<Credential>>,
        saves: AtomicUsize,
    }

    impl CredentialStore for FakeStore {
        fn load(&self) -> Result<Option<Credential>, StoreError> {
            Ok(self.stored.lock().unwrap().clone())
        }

        fn save(&self, credential: &Credential) -> Result<(), StoreError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            *self.stored.lock().unwrap() = Some(credential.clone());
            Ok(())
        }

        fn clear(&self) -> Result<(), StoreError> {
            *self.stored.lock().unwrap() = None;
            Ok(())
        }
    }

    fn wait_for_events(session: &mut SessionManager) -> Vec<SessionEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let events = session.poll();
            if !events.is_empty() {
                return events;
            }
            if Instant::now() > deadline {
                panic!("no session event within 5s");
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn boot_restore_with_no_session_is_silent() {
        // Scenario: restore fails with NoSession at boot — unauthenticated,
        // no error shown, sign-in surface displayed.
        let authorizer = Arc::new(FakeAuthorizer::default());
        let store = Arc::new(FakeStore::default());
        let mut session = SessionManager::new(authorizer, store);

        session.restore();
        let events = wait_for_events(&mut session);

        assert_eq!(events, vec![SessionEvent::RestoreFailed]);
        assert_eq!(
            *session.state(),
            SessionState::Unauthenticated { error: None }
        );
    }

    #[test]
    fn boot_restore_renews_and_persists_before_publishing() {
        let authorizer = Arc::new(FakeAuthorizer::default());
        authorizer
            .restores
            .lock()
            .unwrap()
            .push_back(Ok(credential("renewed")));
        let store = Arc::new(FakeStore::default());
        *store.stored.lock().unwrap() = Some(credential("stale"));
        let mut session = SessionManager::new(authorizer, store.clone());

        session.restore();
        let events = wait_for_events(&mut session);

        assert_eq!(events, vec![SessionEvent::Restored]);
        assert_eq!(session.credential(), Some(&credential("renewed")));
        // the persisted copy was replaced by the renewal before publish
        assert_eq!(*store.stored.lock().unwrap(), Some(credential("renewed")));
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn network_failure_at_boot_is_also_silent() {
        let authorizer = Arc::new(FakeAuthorizer::default());
        authorizer
            .restores
            .lock()
            .unwrap()
            .push_back(Err(RestoreError::Network("offline".into())));
        let store = Arc::new(FakeStore::default());
        *store.stored.lock().unwrap() = Some(credential("stale"));
        let mut session = SessionManager::new(authorizer, store);

        session.restore();
        let events = wait_for_events(&mut session);

        assert_eq!(events, vec![SessionEvent::RestoreFailed]);
        assert_eq!(
            *session.state(),
            SessionState::Unauthenticated { error: None }
        );
    }

    #[test]
    fn sign_in_success_authenticates_and_persists() {
        let authorizer = Arc::new(FakeAuthorizer::default());
        authorizer
            .sign_ins
            .lock()
            .unwrap()
            .push_back(Ok(credential("fresh")));
        let store = Arc::new(FakeStore::default());
        let mut session = SessionManager::new(authorizer, store.clone());
        session.state = SessionState::Unauthenticated { error: None };

        session.sign_in();
        assert_eq!(*session.state(), SessionState::Authenticating);
        let events = wait_for_events(&mut session);

        assert_eq!(events, vec![SessionEvent::SignedIn]);
        assert_eq!(session.credential(), Some(&credential("fresh")));
        assert_eq!(*store.stored.lock().unwrap(), Some(credential("fresh")));
    }

    #[test]
    fn sign_in_failure_shows_inline_error_and_persists_nothing() {
        let authorizer = Arc::new(FakeAuthorizer::default());
        authorizer
            .sign_ins
            .lock()
            .unwrap()
            .push_back(Err(AuthError::Cancelled));
        let store = Arc::new(FakeStore::default());
        let mut session = SessionManager::new(authorizer, store.clone());
        session.state = SessionState::Unauthenticated { error: None };

        session.sign_in();
        let events = wait_for_events(&mut session);

        assert_eq!(events, vec![SessionEvent::SignInFailed]);
        match session.state() {
            SessionState::Unauthenticated { error: Some(msg) } => {
                assert!(msg.contains("cancelled"), "unexpected message: {msg}");
            }
            other => panic!("unexpected state: {other:?}"),
        }
        assert_eq!(*store.stored.lock().unwrap(), None);
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn sign_in_is_ignored_unless_unauthenticated() {
        let authorizer = Arc::new(FakeAuthorizer::default());
        let store = Arc::new(FakeStore::default());
        let mut session = SessionManager::new(authorizer, store);
        session.state = SessionState::Authenticated {
            credential: credential("live"),
        };

        session.sign_in();
        assert_eq!(session.credential(), Some(&credential("live")));
    }

    #[test]
    fn sign_out_clears_both_copies_and_revokes() {
        let authorizer = Arc::new(FakeAuthorizer::default());
        let store = Arc::new(FakeStore::default());
        *store.stored.lock().unwrap() = Some(credential("live"));
        let mut session = SessionManager::new(authorizer.clone(), store.clone());
        session.state = SessionState::Authenticated {
            credential: credential("live"),
        };

        session.sign_out();

        assert_eq!(
            *session.state(),
            SessionState::Unauthenticated { error: None }
        );
        assert_eq!(*store.stored.lock().unwrap(), None);
        // revoke is fire-and-forget on a worker thread
        let deadline = Instant::now() + Duration::from_secs(5);
        while authorizer.revokes.load(Ordering::SeqCst) == 0 {
            if Instant::now() > deadline {
                panic!("revoke was never attempted");
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn completion_after_sign_out_is_dropped() {
        let authorizer = Arc::new(FakeAuthorizer::default());
        authorizer
            .sign_ins
            .lock()
            .unwrap()
            .push_back(Ok(credential("late")));
        let store = Arc::new(FakeStore::default());
        let mut session = SessionManager::new(authorizer, store);
        session.state = SessionState::Unauthenticated { error: None };

        session.sign_in();
        // user signs out before the worker completes
        session.sign_out();

        // give the worker time to finish, then drain
        thread::sleep(Duration::from_millis(50));
        let events = session.poll();
        assert!(events.is_empty());
        assert_eq!(
            *session.state(),
            SessionState::Unauthenticated { error: None }
        );
    }

    #[test]
    fn adopt_renewal_replaces_the_published_credential() {
        let authorizer = Arc::new(FakeAuthorizer::default());
        let store = Arc::new(FakeStore::default());
        let mut session = SessionManager::new(authorizer, store);
        session.state = SessionState::Authenticated {
            credential: credential("old"),
        };

        session.adopt_renewal(credential("new"));
        assert_eq!(session.credential(), Some(&credential("new")));
    }

    #[test]
    fn expire_drops_to_unauthenticated_with_message() {
        let authorizer = Arc::new(FakeAuthorizer::default());
        let store = Arc::new(FakeStore::default());
        *store.stored.lock().unwrap() = Some(credential("dead"));
        let mut session = SessionManager::new(authorizer, store.clone());
        session.state = SessionState::Authenticated {
            credential: credential("dead"),
        };

        session.expire("token revoked");

        assert_eq!(*store.stored.lock().unwrap(), None);
        match session.state() {
            SessionState::Unauthenticated { error: Some(msg) } => {
                assert!(msg.contains("token revoked"));
            }
            other => panic!("unexpected state: {other:?}"),
        }
    }
}
