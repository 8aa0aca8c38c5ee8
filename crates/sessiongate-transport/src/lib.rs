#![warn(missing_docs)]
//! # sessiongate-transport
//!
//! ## Purpose
//! Defines the session transport boundary: the three remote operations the
//! state store consumes (login, logout, refresh) and the HTTP binding that
//! carries them.
//!
//! ## Responsibilities
//! - Validate backend base URL policy (HTTPS only).
//! - Expose an injectable async transport abstraction.
//! - Own bearer-credential attachment through [`AccessTokenSlot`].
//! - Carry the ambient refresh credential via an HTTP cookie store.
//! - Provide a deterministic scripted transport for tests.
//!
//! ## Data flow
//! Store operations call [`SessionTransport`] -> HTTP binding attaches the
//! current bearer token and the browser-style cookie jar -> typed replies
//! flow back for the store to validate and apply.
//!
//! ## Ownership and lifetimes
//! Reply values are owned so the store's state transitions never borrow
//! transport internals.
//!
//! ## Error model
//! Endpoint policy violations, network failures, non-success statuses, and
//! undecodable bodies are surfaced as [`TransportError`]; failures are never
//! encoded as sentinel reply values.
//!
//! ## Security and privacy notes
//! The refresh credential lives only in the cookie store and is never
//! exposed through this crate's API. Token values are not logged.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sessiongate_core::{EPOCH_SENTINEL_MS, Role, User};
use thiserror::Error;
use url::Url;

/// Login operation path relative to the backend base URL.
pub const LOGIN_PATH: &str = "auth/login";
/// Logout operation path relative to the backend base URL.
pub const LOGOUT_PATH: &str = "auth/logout";
/// Refresh operation path relative to the backend base URL.
pub const REFRESH_PATH: &str = "auth/refresh";

/// Login request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Account email; validated only by the backend.
    pub email: String,
    /// Account password; validated only by the backend.
    pub password: String,
}

/// Wire-shaped user record.
///
/// Fields the backend may omit are defaulted here; conversion into
/// [`User`] applies the role fallback and the epoch sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Opaque stable identifier.
    pub id: String,
    /// Account email address.
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Role string mapped through the closed enumeration.
    #[serde(default = "default_role")]
    pub role: Role,
    /// Whether the account is active.
    #[serde(default)]
    pub is_active: bool,
    /// Whether the account email is verified.
    #[serde(default)]
    pub is_verified: bool,
    /// Creation time in Unix epoch milliseconds; may be absent.
    #[serde(default)]
    pub created_on: Option<u64>,
}

fn default_role() -> Role {
    Role::Guest
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        User {
            id: record.id,
            email: record.email,
            name: record.name,
            role: record.role,
            is_active: record.is_active,
            is_verified: record.is_verified,
            created_on_ms: record.created_on.unwrap_or(EPOCH_SENTINEL_MS),
        }
    }
}

/// Reply carried by login and refresh.
///
/// Both fields are optional at the wire level; the store treats a missing
/// token or user as a structurally incomplete session, not this crate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialReply {
    /// Bearer credential for subsequent calls, when issued.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Authenticated user payload, when issued.
    #[serde(default)]
    pub user: Option<UserRecord>,
}

/// Reply carried by logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutReply {
    /// Explicit success flag from the backend.
    pub success: bool,
}

/// Shared attachment point for the current bearer credential.
///
/// The transport is the sole owner of attachment logic: the store writes
/// this slot as a side effect of every state transition, and the HTTP
/// binding reads it when constructing requests. Nothing else touches the
/// token between those two points.
#[derive(Debug, Clone, Default)]
pub struct AccessTokenSlot {
    token: Arc<RwLock<Option<String>>>,
}

impl AccessTokenSlot {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored bearer credential.
    pub fn store(&self, token: Option<String>) {
        let mut slot = self
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = token;
    }

    /// Returns the current bearer credential, if one is known.
    pub fn bearer(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Abstract session transport consumed by the state store.
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// Sends a login request with the given credentials.
    ///
    /// # Errors
    /// Returns [`TransportError`] for network or backend failures.
    async fn login(&self, email: &str, password: &str) -> Result<CredentialReply, TransportError>;

    /// Sends a logout request for the current session.
    ///
    /// # Errors
    /// Returns [`TransportError`] for network or backend failures.
    async fn logout(&self) -> Result<LogoutReply, TransportError>;

    /// Attempts to mint a new access token from the ambient refresh
    /// credential. The credential rides automatically; it is never a
    /// parameter of this call.
    ///
    /// # Errors
    /// Returns [`TransportError`] for network or backend failures.
    async fn refresh(&self) -> Result<CredentialReply, TransportError>;
}

/// Validates backend base URL policy.
///
/// # Semantics
/// A path-bearing base is normalized to end with `/` so that joining an
/// operation path appends to the configured prefix instead of replacing
/// its last segment.
///
/// # Errors
/// Returns [`TransportError::InvalidEndpoint`] when the URL does not parse
/// or does not use HTTPS.
pub fn validate_base_url(base_url: &str) -> Result<Url, TransportError> {
    let mut parsed = Url::parse(base_url)
        .map_err(|error| TransportError::InvalidEndpoint(format!("invalid base url: {error}")))?;

    if parsed.scheme() != "https" {
        return Err(TransportError::InvalidEndpoint(
            "backend base url must use https".to_string(),
        ));
    }

    if !parsed.path().ends_with('/') {
        let normalized = format!("{}/", parsed.path());
        parsed.set_path(&normalized);
    }

    Ok(parsed)
}

/// HTTP binding for the session transport.
///
/// # Notes
/// The client enables a cookie store so the backend-managed http-only
/// refresh credential is sent on every call without ever being visible to
/// callers. The bearer credential is read from the shared
/// [`AccessTokenSlot`] per request.
#[derive(Debug, Clone)]
pub struct HttpSessionTransport {
    base_url: Url,
    client: reqwest::Client,
    tokens: AccessTokenSlot,
}

impl HttpSessionTransport {
    /// Creates a validated HTTP transport.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidEndpoint`] when the base URL
    /// violates endpoint policy, or [`TransportError::Network`] when the
    /// HTTP client cannot be constructed.
    pub fn new(base_url: &str, tokens: AccessTokenSlot) -> Result<Self, TransportError> {
        let base_url = validate_base_url(base_url)?;
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|error| TransportError::Network(error.to_string()))?;

        Ok(Self {
            base_url,
            client,
            tokens,
        })
    }

    /// Returns the configured backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn operation_url(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path)
            .map_err(|error| TransportError::InvalidEndpoint(format!("invalid operation path: {error}")))
    }

    async fn post(&self, path: &str, body: Option<&LoginRequest>) -> Result<reqwest::Response, TransportError> {
        let url = self.operation_url(path)?;
        let mut request = self.client.post(url);

        if let Some(token) = self.tokens.bearer() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|error| TransportError::Network(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        Ok(response)
    }
}

#[async_trait]
impl SessionTransport for HttpSessionTransport {
    async fn login(&self, email: &str, password: &str) -> Result<CredentialReply, TransportError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.post(LOGIN_PATH, Some(&request)).await?;
        response
            .json::<CredentialReply>()
            .await
            .map_err(|error| TransportError::Decode(error.to_string()))
    }

    async fn logout(&self) -> Result<LogoutReply, TransportError> {
        let response = self.post(LOGOUT_PATH, None).await?;
        response
            .json::<LogoutReply>()
            .await
            .map_err(|error| TransportError::Decode(error.to_string()))
    }

    async fn refresh(&self) -> Result<CredentialReply, TransportError> {
        let response = self.post(REFRESH_PATH, None).await?;
        response
            .json::<CredentialReply>()
            .await
            .map_err(|error| TransportError::Decode(error.to_string()))
    }
}

/// Deterministic scripted transport for tests and CI.
///
/// Replies are queued per operation and consumed in order; an exhausted
/// queue yields a network-style failure so unscripted calls surface loudly
/// in tests. The refresh counter supports bootstrap-once assertions.
#[derive(Debug, Default)]
pub struct ScriptedSessionTransport {
    login_replies: Mutex<VecDeque<Result<CredentialReply, TransportError>>>,
    logout_replies: Mutex<VecDeque<Result<LogoutReply, TransportError>>>,
    refresh_replies: Mutex<VecDeque<Result<CredentialReply, TransportError>>>,
    refresh_calls: AtomicUsize,
}

impl ScriptedSessionTransport {
    /// Creates a transport with empty reply queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one login outcome.
    pub fn push_login(&self, reply: Result<CredentialReply, TransportError>) {
        self.login_replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    /// Queues one logout outcome.
    pub fn push_logout(&self, reply: Result<LogoutReply, TransportError>) {
        self.logout_replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    /// Queues one refresh outcome.
    pub fn push_refresh(&self, reply: Result<CredentialReply, TransportError>) {
        self.refresh_replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    /// Returns how many refresh calls were observed.
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn pop<T>(queue: &Mutex<VecDeque<Result<T, TransportError>>>, operation: &str) -> Result<T, TransportError> {
        queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::Network(format!(
                    "scripted transport has no queued {operation} reply"
                )))
            })
    }
}

#[async_trait]
impl SessionTransport for ScriptedSessionTransport {
    async fn login(&self, _email: &str, _password: &str) -> Result<CredentialReply, TransportError> {
        Self::pop(&self.login_replies, "login")
    }

    async fn logout(&self) -> Result<LogoutReply, TransportError> {
        Self::pop(&self.logout_replies, "logout")
    }

    async fn refresh(&self) -> Result<CredentialReply, TransportError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        Self::pop(&self.refresh_replies, "refresh")
    }
}

/// Transport layer error type.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Endpoint violates base URL policy.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// Network-level failure reaching the backend.
    #[error("network failure: {0}")]
    Network(String),
    /// Backend answered with a non-success status.
    #[error("backend returned status {0}")]
    Status(u16),
    /// Response body could not be decoded.
    #[error("undecodable response body: {0}")]
    Decode(String),
}
