#![warn(missing_docs)]
//! # sessiongate-store
//!
//! ## Purpose
//! Implements the authentication state store: the single owner of the
//! process-wide [`Session`] and its legal transitions.
//!
//! ## Responsibilities
//! - Execute bootstrap refresh, login, and logout through an injectable
//!   transport abstraction.
//! - Publish session snapshots to observers over a watch channel.
//! - Mirror every token transition into the transport's attachment slot.
//! - Guarantee the loading bracket around every mutating operation.
//! - Provide the bootstrap sequencer that runs refresh exactly once.
//!
//! ## Data flow
//! App startup triggers [`Bootstrap::run`] -> [`SessionStore`] transitions
//! session state -> route guards and UI observe snapshots through
//! [`SessionStore::subscribe`] -> user-driven login/logout flow through the
//! same store.
//!
//! ## State machine
//! ```text
//! UNKNOWN --bootstrap_refresh (success)--> AUTHENTICATED
//! UNKNOWN --bootstrap_refresh (failure)--> UNAUTHENTICATED
//! UNAUTHENTICATED --login (success)--> AUTHENTICATED
//! UNAUTHENTICATED --login (failure)--> UNAUTHENTICATED (error to caller)
//! AUTHENTICATED --logout (success)--> UNAUTHENTICATED
//! AUTHENTICATED --logout (failure)--> AUTHENTICATED (error to caller)
//! AUTHENTICATED --login (success)--> AUTHENTICATED (clean re-login)
//! ```
//!
//! ## Ownership and lifetimes
//! Observers receive cloned snapshots; nothing outside this crate mutates
//! session state.
//!
//! ## Error model
//! Transport failures and structurally incomplete replies are distinct
//! [`StoreError`] variants. Bootstrap swallows them into a state
//! transition; login and logout re-raise them after the transition (or
//! non-transition) is applied.
//!
//! ## Security and privacy notes
//! Transition events log user identifiers only, never credentials or token
//! values.

use std::sync::Arc;

use sessiongate_core::{Session, SessionStatus, User};
use sessiongate_transport::{AccessTokenSlot, CredentialReply, SessionTransport, TransportError};
use thiserror::Error;
use tokio::sync::watch;
use tokio::sync::{Mutex, OnceCell};

/// Single owner of the process-wide session state.
///
/// Constructed once at process start and shared by reference (or `Arc`)
/// with every component that reads authentication status. The three
/// mutating operations are serialized: an overlapping call queues behind
/// the in-flight one in invocation order instead of racing it.
pub struct SessionStore {
    transport: Arc<dyn SessionTransport>,
    tokens: AccessTokenSlot,
    state: watch::Sender<Session>,
    op_gate: Mutex<()>,
}

impl SessionStore {
    /// Creates a store in the initial unknown state.
    ///
    /// `tokens` must be the same slot the transport reads for bearer
    /// attachment; the store writes it on every transition.
    pub fn new(transport: Arc<dyn SessionTransport>, tokens: AccessTokenSlot) -> Self {
        let (state, _) = watch::channel(Session::new());
        Self {
            transport,
            tokens,
            state,
            op_gate: Mutex::new(()),
        }
    }

    /// Returns the current session snapshot. No side effects.
    pub fn current_status(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Subscribes to session snapshot updates.
    ///
    /// Guards and UI react to transitions through this receiver rather
    /// than polling [`SessionStore::current_status`].
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Attempts to silently resume a session from the ambient refresh
    /// credential.
    ///
    /// Failures never escape this call: any transport failure or
    /// structurally incomplete reply is represented purely as the
    /// unauthenticated state transition.
    pub async fn bootstrap_refresh(&self) {
        let _op = self.op_gate.lock().await;
        let _loading = LoadingBracket::enter(&self.state);

        let outcome = self
            .transport
            .refresh()
            .await
            .map_err(StoreError::Transport)
            .and_then(validate_credential_reply);

        match outcome {
            Ok((access_token, user)) => self.apply_active(access_token, user),
            Err(error) => {
                tracing::debug!(%error, "bootstrap refresh did not resume a session");
                self.apply_logged_out();
            }
        }
    }

    /// Logs in with the given credentials.
    ///
    /// # Errors
    /// Returns [`StoreError::Transport`] or
    /// [`StoreError::IncompleteSession`]; in both cases the session has
    /// already transitioned to the unauthenticated state before the error
    /// reaches the caller, so form handlers can surface the failure while
    /// every other component sees a consistent logged-out session.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), StoreError> {
        let _op = self.op_gate.lock().await;
        let _loading = LoadingBracket::enter(&self.state);

        let outcome = self
            .transport
            .login(email, password)
            .await
            .map_err(StoreError::Transport)
            .and_then(validate_credential_reply);

        match outcome {
            Ok((access_token, user)) => {
                self.apply_active(access_token, user);
                Ok(())
            }
            Err(error) => {
                self.apply_logged_out();
                Err(error)
            }
        }
    }

    /// Logs out the current session.
    ///
    /// # Errors
    /// Returns [`StoreError::Transport`] or [`StoreError::LogoutRejected`].
    /// On failure local state is left unchanged: assuming logged-out while
    /// the server disagrees would silently desynchronize client and server,
    /// so the caller retries instead.
    pub async fn logout(&self) -> Result<(), StoreError> {
        let _op = self.op_gate.lock().await;
        let _loading = LoadingBracket::enter(&self.state);

        let reply = self.transport.logout().await.map_err(StoreError::Transport)?;
        if !reply.success {
            return Err(StoreError::LogoutRejected);
        }

        self.apply_logged_out();
        Ok(())
    }

    fn apply_active(&self, access_token: String, user: User) {
        let user_id = user.id.clone();
        self.tokens.store(Some(access_token.clone()));
        self.state.send_modify(|session| {
            session.status = SessionStatus::Active { access_token, user };
        });
        tracing::info!(%user_id, "session authenticated");
    }

    fn apply_logged_out(&self) {
        self.tokens.store(None);
        self.state.send_modify(|session| {
            session.status = SessionStatus::LoggedOut;
        });
        tracing::info!("session unauthenticated");
    }
}

/// Loading bracket for mutating operations.
///
/// Entering sets `is_loading`; the `Drop` impl clears it, so an early
/// return or a panic in the operation body cannot leave the session stuck
/// loading.
struct LoadingBracket<'a> {
    state: &'a watch::Sender<Session>,
}

impl<'a> LoadingBracket<'a> {
    fn enter(state: &'a watch::Sender<Session>) -> Self {
        state.send_modify(|session| session.is_loading = true);
        Self { state }
    }
}

impl Drop for LoadingBracket<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|session| session.is_loading = false);
    }
}

/// Checks the structural success condition shared by login and refresh:
/// the reply must carry a non-blank token and a user payload.
fn validate_credential_reply(reply: CredentialReply) -> Result<(String, User), StoreError> {
    let access_token = reply
        .access_token
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| StoreError::IncompleteSession("access token missing or empty".to_string()))?;
    let user = reply
        .user
        .ok_or_else(|| StoreError::IncompleteSession("user payload missing".to_string()))?;

    Ok((access_token, User::from(user)))
}

/// Startup sequencer that runs the silent refresh exactly once.
///
/// Concurrent callers all await the same underlying attempt; later calls
/// after completion return immediately.
#[derive(Default)]
pub struct Bootstrap {
    once: OnceCell<()>,
}

impl Bootstrap {
    /// Creates a sequencer that has not yet run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the store's bootstrap refresh if it has not already run.
    pub async fn run(&self, store: &SessionStore) {
        self.once
            .get_or_init(|| async {
                store.bootstrap_refresh().await;
            })
            .await;
    }

    /// Returns `true` once the bootstrap attempt has completed.
    pub fn has_run(&self) -> bool {
        self.once.initialized()
    }
}

/// Store layer error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure (network unreachable, backend status).
    #[error("session transport failure: {0}")]
    Transport(#[from] TransportError),
    /// Success-shaped reply missing the token or the user payload.
    #[error("structurally incomplete session response: {0}")]
    IncompleteSession(String),
    /// Backend explicitly refused the logout.
    #[error("logout rejected by backend")]
    LogoutRejected,
}
