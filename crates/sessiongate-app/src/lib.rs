#![warn(missing_docs)]
//! # sessiongate-app
//!
//! ## Purpose
//! Wires the session client together: configuration, logging, and the
//! single construction point for transport, store, guard, and bootstrap.
//!
//! ## Responsibilities
//! - Read immutable configuration from the environment once at start.
//! - Initialize the tracing subscriber from the configured verbosity.
//! - Construct the token slot, transport, store, and bootstrap sequencer
//!   as one unit so no component outlives the store it observes.
//!
//! ## Data flow
//! Env config -> [`wire_runtime`] -> [`Bootstrap::run`] resolves the
//! session exactly once -> guard checks and UI actions flow through the
//! shared [`SessionStore`].
//!
//! ## Ownership and lifetimes
//! [`AppRuntime`] owns `Arc` handles to the store and bootstrap; tests
//! substitute a fresh runtime with a scripted transport per case.
//!
//! ## Error model
//! Startup failures (bad config, logging init, endpoint policy) are
//! surfaced as [`AppError`] and abort the process; they are never
//! represented as session state.
//!
//! ## Security and privacy notes
//! Configuration values are logged without credentials; the backend base
//! URL is the only startup value echoed.

use std::sync::Arc;

use sessiongate_store::{Bootstrap, SessionStore};
use sessiongate_transport::{
    AccessTokenSlot, HttpSessionTransport, SessionTransport, TransportError, validate_base_url,
};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Build-time application version loaded from the root `VERSION` file.
pub const APP_VERSION: &str = env!("SESSIONGATE_VERSION");

/// Env var holding the backend base URL.
pub const ENV_API_BASE_URL: &str = "SESSIONGATE_API_BASE_URL";
/// Env var holding the log verbosity filter.
pub const ENV_LOG_FILTER: &str = "SESSIONGATE_LOG";
/// Verbosity applied when [`ENV_LOG_FILTER`] is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Returns the app version sourced from the root `VERSION` file.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Immutable startup configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Backend base URL; HTTPS enforced by endpoint policy.
    pub api_base_url: String,
    /// Tracing verbosity filter.
    pub log_filter: String,
}

impl AppConfig {
    /// Creates a validated configuration from explicit values.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] when the base URL violates endpoint
    /// policy.
    pub fn new(api_base_url: impl Into<String>, log_filter: impl Into<String>) -> Result<Self, AppError> {
        let api_base_url = api_base_url.into();
        validate_base_url(&api_base_url)
            .map_err(|error| AppError::Config(error.to_string()))?;

        Ok(Self {
            api_base_url,
            log_filter: log_filter.into(),
        })
    }

    /// Reads configuration from the environment.
    ///
    /// Values are read once; the resulting config is immutable for the
    /// process lifetime.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] when [`ENV_API_BASE_URL`] is missing
    /// or violates endpoint policy.
    pub fn from_env() -> Result<Self, AppError> {
        let api_base_url = std::env::var(ENV_API_BASE_URL).map_err(|_| {
            AppError::Config(format!("{ENV_API_BASE_URL} must be set to the backend base url"))
        })?;
        let log_filter =
            std::env::var(ENV_LOG_FILTER).unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        Self::new(api_base_url, log_filter)
    }
}

/// Initializes the global tracing subscriber from configuration.
///
/// # Errors
/// Returns [`AppError::Logging`] for an invalid filter or a second
/// initialization attempt.
pub fn init_tracing(config: &AppConfig) -> Result<(), AppError> {
    let filter = EnvFilter::try_new(&config.log_filter)
        .map_err(|error| AppError::Logging(format!("invalid log filter: {error}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| AppError::Logging(error.to_string()))
}

/// Shared handles produced by the single construction point.
#[derive(Clone)]
pub struct AppRuntime {
    /// Bearer attachment slot shared between store and transport.
    pub tokens: AccessTokenSlot,
    /// Process-wide session store.
    pub store: Arc<SessionStore>,
    /// Startup sequencer; runs the silent refresh exactly once.
    pub bootstrap: Arc<Bootstrap>,
}

/// Wires the production runtime against the configured HTTP backend.
///
/// # Errors
/// Returns [`AppError::Transport`] when the HTTP transport cannot be
/// constructed.
pub fn wire_runtime(config: &AppConfig) -> Result<AppRuntime, AppError> {
    let tokens = AccessTokenSlot::new();
    let transport = HttpSessionTransport::new(&config.api_base_url, tokens.clone())?;
    Ok(wire_runtime_with(Arc::new(transport), tokens))
}

/// Wires a runtime around an injected transport.
///
/// Tests substitute a scripted transport here; the wiring is otherwise
/// identical to production.
pub fn wire_runtime_with(
    transport: Arc<dyn SessionTransport>,
    tokens: AccessTokenSlot,
) -> AppRuntime {
    let store = Arc::new(SessionStore::new(transport, tokens.clone()));
    AppRuntime {
        tokens,
        store,
        bootstrap: Arc::new(Bootstrap::new()),
    }
}

/// App startup error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration is missing or violates policy.
    #[error("configuration error: {0}")]
    Config(String),
    /// Tracing subscriber could not be installed.
    #[error("logging initialization failed: {0}")]
    Logging(String),
    /// Transport construction failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}
