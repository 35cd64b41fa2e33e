pub mod authorizer;
pub mod credential;
pub mod oauth;
pub mod session;
pub mod store;

pub use authorizer::{AuthError, Authorizer, RestoreError};
pub use credential::Credential;
pub use session::{SessionEvent, SessionManager, SessionState};
pub use store::{CredentialStore, FileCredentialStore, StoreError};
