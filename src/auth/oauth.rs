use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::auth::authorizer::{AuthError, Authorizer, RestoreError};
use crate::auth::credential::Credential;
use crate::model::config::GoogleConfig;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";

/// How long the loopback listener waits for the browser redirect.
const CONSENT_DEADLINE: Duration = Duration::from_secs(5 * 60);

const CONSENT_OK_PAGE: &str = "<html><body><h3>Signed in</h3>\
<p>You can close this window and return to the terminal.</p></body></html>";
const CONSENT_FAILED_PAGE: &str = "<html><body><h3>Sign-in did not complete</h3>\
<p>You can close this window and retry from the terminal.</p></body></html>";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Deserialize)]
struct TokenErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// OAuth 2.0 authorization-code flow for a native app: consent in the
/// system browser, the grant delivered to a loopback listener, tokens
/// exchanged and renewed against the provider's token endpoint.
pub struct GoogleAuthorizer {
    http: Client,
    config: GoogleConfig,
}

impl GoogleAuthorizer {
    pub fn new(config: GoogleConfig) -> Self {
        GoogleAuthorizer {
            http: Client::new(),
            config,
        }
    }

    fn consent_url(&self, redirect_uri: &str, state: &str) -> Result<String, AuthError> {
        let url = reqwest::Url::parse_with_params(
            AUTH_URL,
            [
                ("response_type", "code"),
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("scope", self.config.scopes.as_str()),
                // offline access is what makes the session silently renewable
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
        .map_err(|e| AuthError::Listener(format!("consent url: {e}")))?;
        Ok(url.to_string())
    }

    fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<Credential, AuthError> {
        let resp = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .map_err(|e| AuthError::Network(e.to_string()))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(AuthError::Exchange(format_token_error(status, &body)));
        }
        let token: TokenResponse = resp.json().map_err(|e| AuthError::Exchange(e.to_string()))?;
        Ok(credential_from(token, None))
    }
}

impl Authorizer for GoogleAuthorizer {
    fn sign_in(&self) -> Result<Credential, AuthError> {
        // bind the listener first so the redirect always has somewhere to land
        let (listener, port) = bind_loopback().map_err(|e| AuthError::Listener(e.to_string()))?;
        let redirect_uri = format!("http://127.0.0.1:{port}/callback");
        let state: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let url = self.consent_url(&redirect_uri, &state)?;

        debug!(port, "opening consent screen");
        webbrowser::open(&url).map_err(|e| AuthError::Browser(e.to_string()))?;

        let mut stream = accept_redirect(&listener)?;
        let params = read_redirect_params(&stream).unwrap_or_default();
        let lookup = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };

        if let Some(err) = lookup("error") {
            respond(&mut stream, CONSENT_FAILED_PAGE);
            if err == "access_denied" {
                return Err(AuthError::Cancelled);
            }
            return Err(AuthError::Denied(err));
        }
        let Some(code) = lookup("code") else {
            respond(&mut stream, CONSENT_FAILED_PAGE);
            return Err(AuthError::Denied(
                "redirect carried no authorization code".into(),
            ));
        };
        if lookup("state").as_deref() != Some(state.as_str()) {
            respond(&mut stream, CONSENT_FAILED_PAGE);
            return Err(AuthError::Denied("state mismatch, please retry".into()));
        }
        respond(&mut stream, CONSENT_OK_PAGE);

        self.exchange_code(&code, &redirect_uri)
    }

    fn restore_silently(&self, stored: &Credential) -> Result<Credential, RestoreError> {
        let Some(refresh) = stored.refresh_token.clone() else {
            return Err(RestoreError::NoSession);
        };
        let resp = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh.as_str()),
            ])
            .send()
            .map_err(|e| RestoreError::Network(e.to_string()))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(RestoreError::Rejected(format_token_error(status, &body)));
        }
        let token: TokenResponse = resp
            .json()
            .map_err(|e| RestoreError::Rejected(e.to_string()))?;
        // the provider often omits the refresh token on renewal; keep the
        // one we renewed with
        Ok(credential_from(token, Some(refresh)))
    }

    fn sign_out(&self, credential: &Credential) {
        let token = credential
            .refresh_token
            .clone()
            .unwrap_or_else(|| credential.access_token.clone());
        match self
            .http
            .post(REVOKE_URL)
            .form(&[("token", token.as_str())])
            .send()
        {
            Ok(resp) if resp.status().is_success() => debug!("revoked remote session"),
            Ok(resp) => warn!(status = %resp.status(), "revoke was not accepted"),
            Err(e) => warn!(error = %e, "revoke request failed"),
        }
    }
}

fn credential_from(token: TokenResponse, carried_refresh: Option<String>) -> Credential {
    Credential {
        access_token: token.access_token,
        refresh_token: token.refresh_token.or(carried_refresh),
        expires_at: token
            .expires_in
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
    }
}

fn bind_loopback() -> std::io::Result<(TcpListener, u16)> {
    // port 0 lets the OS pick a free port; the listener stays open until
    // the redirect arrives
    let listener = TcpListener::bind(("127.0.0.1", 0))?;
    let port = listener.local_addr()?.port();
    Ok((listener, port))
}

/// Wait for the single provider redirect, bounded by the consent deadline.
fn accept_redirect(listener: &TcpListener) -> Result<TcpStream, AuthError> {
    listener
        .set_nonblocking(true)
        .map_err(|e| AuthError::Listener(e.to_string()))?;
    let deadline = Instant::now() + CONSENT_DEADLINE;
    loop {
        match listener.accept() {
            Ok((stream, _addr)) => {
                stream
                    .set_nonblocking(false)
                    .map_err(|e| AuthError::Listener(e.to_string()))?;
                return Ok(stream);
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                if Instant::now() >= deadline {
                    return Err(AuthError::TimedOut);
                }
                std::thread::sleep(Duration::from_millis(200));
            }
            Err(e) => return Err(AuthError::Listener(e.to_string())),
        }
    }
}

/// Read the request line of the redirect and return its query parameters.
/// Headers are drained so the browser sees a clean close; the body is not
/// waited for.
fn read_redirect_params(stream: &TcpStream) -> Option<Vec<(String, String)>> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).ok()? == 0 {
        return None;
    }
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).ok()? == 0 {
            break;
        }
        if line == "\r\n" {
            break;
        }
    }
    // e.g. "GET /callback?code=...&state=... HTTP/1.1"
    let path = request_line.split_whitespace().nth(1)?;
    Some(query_pairs(path))
}

fn query_pairs(path: &str) -> Vec<(String, String)> {
    match reqwest::Url::parse(&format!("http://127.0.0.1{path}")) {
        Ok(url) => url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn respond(stream: &mut TcpStream, body: &str) {
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
    let _ = stream.shutdown(std::net::Shutdown::Both);
}

fn format_token_error(status: reqwest::StatusCode, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return format!("HTTP {status}");
    }
    if let Ok(err) = serde_json::from_str::<TokenErrorBody>(trimmed) {
        return match err.error_description {
            Some(desc) => format!("HTTP {status}: {desc} ({})", err.error),
            None => format!("HTTP {status}: {}", err.error),
        };
    }
    let mut flat: String = trimmed.replace(['\n', '\r'], " ").chars().take(200).collect();
    if flat.len() < trimmed.len() {
        flat.push_str("...");
    }
    format!("HTTP {status}: {flat}")
}
