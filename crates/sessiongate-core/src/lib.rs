#![warn(missing_docs)]
//! # sessiongate-core
//!
//! ## Purpose
//! Defines the pure session data model used across the `sessiongate`
//! workspace.
//!
//! ## Responsibilities
//! - Represent the client's complete view of authentication status.
//! - Enforce the access-token/current-user pairing by construction.
//! - Model user records with closed role enumeration and safe fallbacks.
//!
//! ## Data flow
//! The state store publishes [`Session`] snapshots. Route guards and UI
//! code read snapshots through the derived accessors; nothing outside the
//! store mutates them.
//!
//! ## Ownership and lifetimes
//! Session and user values are owned (`String` fields) so snapshots can be
//! cloned into observers without borrow coupling to the store.
//!
//! ## Error model
//! Validated constructors return [`CoreError`] variants with
//! caller-actionable categorization.
//!
//! ## Security and privacy notes
//! This crate never logs token values. `Debug` output of
//! [`SessionStatus::Active`] includes the token only through the derived
//! impl; callers must not route session debug output into persisted logs.
//!
//! ## Example
//! ```rust
//! use sessiongate_core::{Session, SessionStatus};
//!
//! let session = Session::new();
//! assert!(matches!(session.status, SessionStatus::Unknown));
//! assert!(!session.is_authenticated());
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Sentinel timestamp used when the backend omits a creation time.
pub const EPOCH_SENTINEL_MS: u64 = 0;

/// Closed role enumeration for authenticated users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Administrative account.
    Admin,
    /// Regular account.
    User,
    /// Least-privileged account; also the fallback for unrecognized values.
    Guest,
}

impl Role {
    /// Maps a wire-level role string onto the closed enumeration.
    ///
    /// # Semantics
    /// Unrecognized values fall back to [`Role::Guest`], the
    /// least-privileged role, rather than failing deserialization.
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "user" => Role::User,
            _ => Role::Guest,
        }
    }

    /// Returns the canonical wire string for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Guest => "guest",
        }
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Role::from_wire(&raw))
    }
}

/// Value type describing the currently authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Opaque stable identifier assigned by the backend.
    pub id: String,
    /// Account email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Account role from the closed enumeration.
    pub role: Role,
    /// Whether the account is active.
    pub is_active: bool,
    /// Whether the account email is verified.
    pub is_verified: bool,
    /// Account creation time in Unix epoch milliseconds.
    ///
    /// An absent backend value maps to [`EPOCH_SENTINEL_MS`], not an error.
    pub created_on_ms: u64,
}

/// Three-valued authentication status.
///
/// A single tagged variant rather than two independently-nullable fields:
/// the access token and the current user transition together, so a token
/// without a user (or the reverse) is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// No authentication action has been attempted since process start.
    Unknown,
    /// An attempt completed without a session: a failed refresh/login or an
    /// explicit logout.
    LoggedOut,
    /// A valid session with its bearer credential and user record.
    Active {
        /// Bearer credential attached to backend calls.
        access_token: String,
        /// Authenticated user record.
        user: User,
    },
}

impl SessionStatus {
    /// Constructs a validated active status.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyAccessToken`] when the token is blank;
    /// an active status must always carry a usable credential.
    pub fn active(access_token: impl Into<String>, user: User) -> Result<Self, CoreError> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(CoreError::EmptyAccessToken);
        }

        Ok(SessionStatus::Active { access_token, user })
    }

    /// Returns the bearer credential when a session is active.
    pub fn access_token(&self) -> Option<&str> {
        match self {
            SessionStatus::Active { access_token, .. } => Some(access_token),
            SessionStatus::Unknown | SessionStatus::LoggedOut => None,
        }
    }

    /// Returns the current user when a session is active.
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionStatus::Active { user, .. } => Some(user),
            SessionStatus::Unknown | SessionStatus::LoggedOut => None,
        }
    }
}

/// Snapshot of the client's complete authentication view.
///
/// Created once per process in the `Unknown` state and mutated exclusively
/// by the state store; all other components read cloned snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// `true` while a refresh, login, or logout is in flight.
    pub is_loading: bool,
    /// Paired token/user status.
    pub status: SessionStatus,
}

impl Session {
    /// Creates the initial process-wide session snapshot.
    pub fn new() -> Self {
        Self {
            is_loading: false,
            status: SessionStatus::Unknown,
        }
    }

    /// Derived flag: `true` iff a concrete user record is present.
    pub fn is_authenticated(&self) -> bool {
        self.status.user().is_some()
    }

    /// Returns the bearer credential when authenticated.
    pub fn access_token(&self) -> Option<&str> {
        self.status.access_token()
    }

    /// Returns the current user when authenticated.
    pub fn current_user(&self) -> Option<&User> {
        self.status.user()
    }

    /// Returns `true` once authentication status has been resolved.
    ///
    /// A session is unresolved while an operation is in flight or while no
    /// authentication attempt has completed since process start. Gate logic
    /// must not navigate on an unresolved session.
    pub fn is_resolved(&self) -> bool {
        !self.is_loading && !matches!(self.status, SessionStatus::Unknown)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Error type for core model validation failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Active sessions must carry a non-blank bearer credential.
    #[error("access token must be non-empty for an active session")]
    EmptyAccessToken,
}

#[cfg(test)]
mod tests {
    //! Unit tests for session status pairing and role fallback.

    use super::*;

    fn fixture_user() -> User {
        User {
            id: "u1".to_string(),
            email: "a@b.com".to_string(),
            name: "Ada".to_string(),
            role: Role::User,
            is_active: true,
            is_verified: true,
            created_on_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn token_and_user_are_paired_by_construction() {
        let status = SessionStatus::active("tok1", fixture_user()).expect("valid status");
        assert_eq!(status.access_token(), Some("tok1"));
        assert_eq!(status.user().map(|user| user.id.as_str()), Some("u1"));

        assert!(SessionStatus::Unknown.access_token().is_none());
        assert!(SessionStatus::Unknown.user().is_none());
        assert!(SessionStatus::LoggedOut.access_token().is_none());
        assert!(SessionStatus::LoggedOut.user().is_none());
    }

    #[test]
    fn active_status_rejects_blank_token() {
        assert!(matches!(
            SessionStatus::active("   ", fixture_user()),
            Err(CoreError::EmptyAccessToken)
        ));
    }

    #[test]
    fn role_fallback_maps_unrecognized_values_to_guest() {
        assert_eq!(Role::from_wire("admin"), Role::Admin);
        assert_eq!(Role::from_wire("User"), Role::User);
        assert_eq!(Role::from_wire("guest"), Role::Guest);
        assert_eq!(Role::from_wire("superuser"), Role::Guest);
        assert_eq!(Role::from_wire(""), Role::Guest);
    }

    #[test]
    fn new_session_starts_unknown_and_unresolved() {
        let session = Session::new();
        assert!(!session.is_loading);
        assert!(!session.is_authenticated());
        assert!(!session.is_resolved());
        assert!(session.access_token().is_none());
        assert!(session.current_user().is_none());
    }

    #[test]
    fn logged_out_session_is_resolved_but_not_authenticated() {
        let session = Session {
            is_loading: false,
            status: SessionStatus::LoggedOut,
        };
        assert!(session.is_resolved());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn loading_session_is_never_resolved() {
        let session = Session {
            is_loading: true,
            status: SessionStatus::LoggedOut,
        };
        assert!(!session.is_resolved());
    }
}
