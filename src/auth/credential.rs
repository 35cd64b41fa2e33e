use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Leeway before expiry at which the access token counts as stale.
const EXPIRY_LEEWAY_SECS: i64 = 60;

/// The access/refresh token pair representing an authorized session with
/// the remote task provider. Opaque beyond expiry-driven renewal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Whether the access token is expired or about to expire. Credentials
    /// without an expiry are used as-is until the provider rejects them.
    pub fn needs_renewal(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(at) => now + Duration::seconds(EXPIRY_LEEWAY_SECS) >= at,
            None => false,
        }
    }
}
