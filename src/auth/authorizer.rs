use crate::auth::credential::Credential;

/// Error type for interactive sign-in. Shown inline on the sign-in surface;
/// always recoverable by retrying.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("authorization was cancelled")]
    Cancelled,
    #[error("authorization timed out before the browser completed")]
    TimedOut,
    #[error("authorization denied: {0}")]
    Denied(String),
    #[error("could not start the local redirect listener: {0}")]
    Listener(String),
    #[error("could not open the browser: {0}")]
    Browser(String),
    #[error("token exchange failed: {0}")]
    Exchange(String),
    #[error("network error: {0}")]
    Network(String),
}

/// Error type for silent renewal.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RestoreError {
    /// Expected whenever no session has been saved; never shown to the user.
    #[error("no stored session")]
    NoSession,
    /// The provider rejected the stored credential (revoked, scope change).
    #[error("stored session was rejected: {0}")]
    Rejected(String),
    #[error("network error: {0}")]
    Network(String),
}

/// Interactive and silent authorization against the remote provider.
///
/// Implementations are driven from worker threads; they block their caller
/// and never touch session state themselves.
pub trait Authorizer: Send + Sync {
    /// Opens the consent flow and blocks until the user completes or
    /// abandons it.
    fn sign_in(&self) -> Result<Credential, AuthError>;

    /// Non-interactive renewal from a stored credential.
    fn restore_silently(&self, stored: &Credential) -> Result<Credential, RestoreError>;

    /// Best-effort remote revoke. Local state is cleared regardless of the
    /// outcome, so failures are only logged.
    fn sign_out(&self, credential: &Credential);
}
