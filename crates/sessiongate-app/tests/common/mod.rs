//! Shared fixtures for app integration tests.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use sessiongate_core::Role;
use sessiongate_transport::{
    CredentialReply, LogoutReply, SessionTransport, TransportError, UserRecord,
};
use tokio::sync::Notify;

/// Creates a deterministic wire user record.
#[allow(dead_code)]
pub fn fixture_record(id: &str, email: &str) -> UserRecord {
    UserRecord {
        id: id.to_string(),
        email: email.to_string(),
        name: "Ada".to_string(),
        role: Role::User,
        is_active: true,
        is_verified: true,
        created_on: Some(1_700_000_000_000),
    }
}

/// Creates a complete credential reply with the given token.
#[allow(dead_code)]
pub fn fixture_credential_reply(token: &str) -> CredentialReply {
    CredentialReply {
        access_token: Some(token.to_string()),
        user: Some(fixture_record("u1", "a@b.com")),
    }
}

/// Transport whose refresh parks until released, so tests can drive the
/// in-flight window deterministically.
#[allow(dead_code)]
pub struct HeldRefreshTransport {
    release: Notify,
    reply: Mutex<Option<Result<CredentialReply, TransportError>>>,
}

#[allow(dead_code)]
impl HeldRefreshTransport {
    /// Creates a held transport that eventually yields the given outcome.
    pub fn new(reply: Result<CredentialReply, TransportError>) -> Self {
        Self {
            release: Notify::new(),
            reply: Mutex::new(Some(reply)),
        }
    }

    /// Releases the parked refresh call.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl SessionTransport for HeldRefreshTransport {
    async fn login(&self, _email: &str, _password: &str) -> Result<CredentialReply, TransportError> {
        Err(TransportError::Network("login not scripted".to_string()))
    }

    async fn logout(&self) -> Result<LogoutReply, TransportError> {
        Err(TransportError::Network("logout not scripted".to_string()))
    }

    async fn refresh(&self) -> Result<CredentialReply, TransportError> {
        self.release.notified().await;
        self.reply
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_else(|| Err(TransportError::Network("reply consumed".to_string())))
    }
}
