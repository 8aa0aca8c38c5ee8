#![warn(missing_docs)]
//! # sessiongate-app binary
//!
//! Headless entry point: resolves configuration, runs the one-time silent
//! refresh, and reports the resolved session status. The runtime is
//! current-thread flavored; all application logic is cooperative and
//! single-threaded.

use sessiongate_app::{AppConfig, AppError, app_version, init_tracing, wire_runtime};
use sessiongate_guard::{GuardDecision, Route, check_protected_entry};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("failed to start sessiongate: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    init_tracing(&config)?;
    tracing::info!(
        version = app_version(),
        base_url = %config.api_base_url,
        "starting session client"
    );

    let runtime = wire_runtime(&config)?;
    runtime.bootstrap.run(&runtime.store).await;

    let session = runtime.store.current_status();
    println!("sessiongate-app {}", app_version());
    println!("authenticated={}", session.is_authenticated());
    match check_protected_entry(Route::Dashboard, &session) {
        GuardDecision::Render => println!("entry={}", Route::Dashboard.as_path()),
        GuardDecision::Redirect(destination) => println!("entry={destination}"),
    }
    Ok(())
}
