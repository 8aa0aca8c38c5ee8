//! Integration tests for the authenticating gate over a live store.

mod common;

use std::sync::Arc;

use sessiongate_app::wire_runtime_with;
use sessiongate_guard::{GuardDecision, Route, check_protected_entry, resolve_authenticating};
use sessiongate_transport::AccessTokenSlot;

#[tokio::test]
async fn authenticating_gate_tests_protected_entry_waits_then_resumes_target() {
    let transport = Arc::new(common::HeldRefreshTransport::new(Ok(
        common::fixture_credential_reply("tok1"),
    )));
    let runtime = wire_runtime_with(transport.clone(), AccessTokenSlot::new());

    let bootstrap_task = tokio::spawn({
        let runtime = runtime.clone();
        async move { runtime.bootstrap.run(&runtime.store).await }
    });

    let mut updates = runtime.store.subscribe();
    updates
        .wait_for(|session| session.is_loading)
        .await
        .expect("bootstrap should mark the session loading");

    // Entry check while resolution is in flight defers to the waiting
    // destination with the original path encoded.
    let decision = check_protected_entry(Route::Dashboard, &runtime.store.current_status());
    assert_eq!(
        decision,
        GuardDecision::Redirect("/authenticating?redirect=%2Fdashboard".to_string())
    );

    let gate = tokio::spawn(resolve_authenticating(
        runtime.store.subscribe(),
        "redirect=%2Fdashboard",
    ));

    transport.release();
    bootstrap_task.await.expect("bootstrap task should complete");

    let destination = gate
        .await
        .expect("gate task should complete")
        .expect("store should remain reachable");
    assert_eq!(destination, "/dashboard");

    // The resumed destination now renders directly.
    assert_eq!(
        check_protected_entry(Route::Dashboard, &runtime.store.current_status()),
        GuardDecision::Render
    );
}

#[tokio::test]
async fn authenticating_gate_tests_failed_bootstrap_forwards_target_to_login() {
    let transport = Arc::new(common::HeldRefreshTransport::new(Err(
        sessiongate_transport::TransportError::Status(401),
    )));
    let runtime = wire_runtime_with(transport.clone(), AccessTokenSlot::new());

    let bootstrap_task = tokio::spawn({
        let runtime = runtime.clone();
        async move { runtime.bootstrap.run(&runtime.store).await }
    });
    let gate = tokio::spawn(resolve_authenticating(
        runtime.store.subscribe(),
        "redirect=%2Fsettings",
    ));

    transport.release();
    bootstrap_task.await.expect("bootstrap task should complete");

    let destination = gate
        .await
        .expect("gate task should complete")
        .expect("store should remain reachable");
    assert_eq!(destination, "/login?redirect=%2Fsettings");
}
