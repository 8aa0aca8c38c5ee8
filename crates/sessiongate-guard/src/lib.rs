#![warn(missing_docs)]
//! # sessiongate-guard
//!
//! ## Purpose
//! Implements the route guard and the authenticating gate: the policy that
//! decides, for any navigation into a protected area, whether to render,
//! wait, or redirect.
//!
//! ## Responsibilities
//! - Define the closed route enumeration and its path mapping.
//! - Sanitize redirect parameters against the closed set.
//! - Gate protected destinations behind resolved authentication status.
//! - Resolve the authenticating waiting destination once the store settles.
//! - Trigger logout on entry to the logout destination.
//!
//! ## Data flow
//! Navigation events produce [`GuardDecision`] values from session
//! snapshots; the authenticating gate subscribes to store updates and
//! emits the post-resolution destination.
//!
//! ## Ownership and lifetimes
//! The guard only reads session snapshots; all mutation flows through
//! `sessiongate-store`.
//!
//! ## Error model
//! The only guard error is a detached store subscription, which signals a
//! construction/wiring defect rather than a recoverable runtime condition.
//!
//! ## Security and privacy notes
//! Redirect parameters are coerced into the closed route set before any
//! navigation, so the redirect mechanism cannot be used to leave the
//! application or synthesize arbitrary internal paths.

use sessiongate_core::Session;
use sessiongate_store::{SessionStore, StoreError};
use thiserror::Error;
use tokio::sync::watch;
use url::form_urlencoded;

/// Query parameter carrying the originally requested destination.
pub const REDIRECT_PARAM: &str = "redirect";

/// Closed enumeration of application destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Application root.
    Root,
    /// Login form destination.
    Login,
    /// Logout trigger destination.
    Logout,
    /// Waiting destination shown while authentication status resolves.
    Authenticating,
    /// Protected dashboard view.
    Dashboard,
    /// Protected profile view.
    Profile,
    /// Protected settings view.
    Settings,
}

impl Route {
    /// Returns the canonical path for this destination.
    pub fn as_path(&self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Login => "/login",
            Route::Logout => "/logout",
            Route::Authenticating => "/authenticating",
            Route::Dashboard => "/dashboard",
            Route::Profile => "/profile",
            Route::Settings => "/settings",
        }
    }

    /// Parses a path into a known destination.
    ///
    /// Returns `None` for anything outside the closed set.
    pub fn parse(path: &str) -> Option<Self> {
        match path {
            "/" => Some(Route::Root),
            "/login" => Some(Route::Login),
            "/logout" => Some(Route::Logout),
            "/authenticating" => Some(Route::Authenticating),
            "/dashboard" => Some(Route::Dashboard),
            "/profile" => Some(Route::Profile),
            "/settings" => Some(Route::Settings),
            _ => None,
        }
    }

    /// Returns `true` for destinations that require authentication.
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Dashboard | Route::Profile | Route::Settings)
    }
}

/// Coerces a decoded redirect value into the closed set.
///
/// # Semantics
/// Only known protected paths survive; everything else (unknown paths,
/// absolute URLs, traversal attempts, non-protected destinations) resolves
/// to the application root. This closes off open-redirect injection.
pub fn sanitize_redirect(raw: &str) -> Route {
    match Route::parse(raw) {
        Some(route) if route.is_protected() => route,
        _ => Route::Root,
    }
}

/// Extracts and sanitizes the redirect target from a raw query string.
///
/// A missing parameter resolves to the application root.
pub fn redirect_from_query(query: &str) -> Route {
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == REDIRECT_PARAM)
        .map(|(_, value)| sanitize_redirect(&value))
        .unwrap_or(Route::Root)
}

fn redirect_query(target: Route) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair(REDIRECT_PARAM, target.as_path())
        .finish()
}

/// Builds the authenticating waiting destination carrying the original
/// target.
pub fn authenticating_path(target: Route) -> String {
    format!(
        "{}?{}",
        Route::Authenticating.as_path(),
        redirect_query(target)
    )
}

/// Builds the login destination carrying the original target, so a later
/// successful login can resume the navigation intent.
pub fn login_path(target: Route) -> String {
    format!("{}?{}", Route::Login.as_path(), redirect_query(target))
}

/// Outcome of a synchronous entry check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Render the requested destination.
    Render,
    /// Navigate to the carried path instead of rendering.
    Redirect(String),
}

/// Entry check for protected destinations.
///
/// Protected content is never rendered before authentication status is
/// known: an unauthenticated (or still unresolved) session redirects to
/// the authenticating destination with the original path encoded.
pub fn check_protected_entry(destination: Route, session: &Session) -> GuardDecision {
    if !destination.is_protected() || session.is_authenticated() {
        return GuardDecision::Render;
    }

    let target = authenticating_path(destination);
    tracing::debug!(destination = destination.as_path(), "deferring protected entry");
    GuardDecision::Redirect(target)
}

/// Entry check for the login destination.
///
/// An already-authenticated session is redirected to the root without
/// rendering the form, so back-navigation and stale links cannot re-show
/// the login form to a signed-in user.
pub fn check_login_entry(session: &Session) -> GuardDecision {
    if session.is_authenticated() {
        return GuardDecision::Redirect(Route::Root.as_path().to_string());
    }

    GuardDecision::Render
}

/// Resolves the authenticating waiting destination.
///
/// Performs no navigation while the session is unresolved; the instant it
/// resolves, yields the decoded original target on success or the login
/// destination carrying that same target on failure. No third destination
/// is reachable.
///
/// # Errors
/// Returns [`GuardError::StoreClosed`] when the store subscription is
/// detached: a wiring defect at construction time, not a runtime
/// condition to recover from.
pub async fn resolve_authenticating(
    mut updates: watch::Receiver<Session>,
    query: &str,
) -> Result<String, GuardError> {
    let target = redirect_from_query(query);

    let resolved = updates
        .wait_for(Session::is_resolved)
        .await
        .map_err(|_| GuardError::StoreClosed)?;
    let authenticated = resolved.is_authenticated();
    drop(resolved);

    let destination = if authenticated {
        target.as_path().to_string()
    } else {
        login_path(target)
    };
    tracing::debug!(%destination, authenticated, "authenticating gate resolved");
    Ok(destination)
}

/// Entry handler for the logout destination.
///
/// Unconditionally triggers the store's logout, independent of current
/// authentication status; logging out an already logged-out session is a
/// protocol-level no-op.
///
/// # Errors
/// Propagates [`StoreError`] so the caller can surface a message; the
/// store guarantees local state stayed consistent with the server either
/// way.
pub async fn on_logout_entry(store: &SessionStore) -> Result<(), StoreError> {
    store.logout().await
}

/// Guard layer error type.
#[derive(Debug, Error)]
pub enum GuardError {
    /// The session store subscription is detached. Fatal: indicates the
    /// guard was wired outside the store's lifetime.
    #[error("session store subscription is detached")]
    StoreClosed,
}
