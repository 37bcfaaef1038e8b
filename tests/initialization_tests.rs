mod common;

use std::time::Duration;

use common::{RecordingHost, settle};
use yandex_games_bridge::correlation::UnroutableReason;
use yandex_games_bridge::{
    Bridge, BridgeConfig, BridgeError, HostCall, InitFailure, InitializationState, RouteOutcome,
};

fn fresh_bridge() -> (Bridge, std::sync::Arc<RecordingHost>) {
    let host = RecordingHost::new();
    let bridge = Bridge::new(host.clone(), BridgeConfig::default()).unwrap();
    (bridge, host)
}

#[tokio::test]
async fn test_operations_before_initialize_fail_fast() {
    let (bridge, host) = fresh_bridge();

    let err = bridge.get_player_data().await.unwrap_err();
    assert!(matches!(
        err,
        BridgeError::NotInitialized(InitializationState::Uninitialized)
    ));
    assert!(host.calls().is_empty());
}

#[tokio::test]
async fn test_ready_callback_opens_the_gate() {
    let (bridge, host) = fresh_bridge();

    let (result, outcome) = tokio::join!(bridge.initialize(), async {
        settle().await;
        // Operations issued mid-initialization are refused
        assert!(matches!(
            bridge.show_interstitial_ad().await,
            Err(BridgeError::NotInitialized(InitializationState::Initializing))
        ));
        bridge.dispatch("OnInitialized", "").unwrap()
    });

    assert!(result.is_ok());
    assert_eq!(outcome, RouteOutcome::Initialization);
    assert!(bridge.is_initialized());
    assert_eq!(host.calls(), vec![HostCall::Initialize]);

    // Re-entrant initialize after Ready is a no-op
    bridge.initialize().await.unwrap();
    assert_eq!(host.initialize_calls(), 1);
}

#[tokio::test]
async fn test_catalog_while_failed_is_not_initialized() {
    let (bridge, host) = fresh_bridge();

    let (result, _) = tokio::join!(bridge.initialize(), async {
        settle().await;
        bridge.dispatch("OnInitializeError", "SDK blocked").unwrap();
    });
    assert!(matches!(result, Err(BridgeError::InitializationFailed(ref msg)) if msg == "SDK blocked"));
    assert_eq!(
        bridge.state(),
        InitializationState::Failed(InitFailure::Platform("SDK blocked".into()))
    );

    let err = bridge.get_catalog().await.unwrap_err();
    assert!(matches!(
        err,
        BridgeError::NotInitialized(InitializationState::Failed(_))
    ));
    assert_eq!(host.calls(), vec![HostCall::Initialize]);

    // No automatic retry
    assert!(bridge.initialize().await.is_err());
    assert_eq!(host.initialize_calls(), 1);
}

#[tokio::test]
async fn test_concurrent_initialize_issues_one_host_call() {
    let (bridge, host) = fresh_bridge();

    let (a, b, c, _) = tokio::join!(
        bridge.initialize(),
        bridge.initialize(),
        bridge.initialize(),
        async {
            settle().await;
            bridge.dispatch("OnInitialized", "").unwrap();
        }
    );

    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(host.initialize_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_initialize_times_out_and_late_ready_is_unroutable() {
    let host = RecordingHost::new();
    let config = BridgeConfig::new().init_timeout(Duration::from_secs(3));
    let bridge = Bridge::new(host.clone(), config).unwrap();

    let err = bridge.initialize().await.unwrap_err();
    assert!(matches!(err, BridgeError::InitializationTimeout(d) if d == Duration::from_secs(3)));

    let outcome = bridge.dispatch("OnInitialized", "").unwrap();
    assert_eq!(
        outcome,
        RouteOutcome::Unroutable(UnroutableReason::InitializationNotInFlight)
    );
    assert!(!bridge.is_initialized());
}

#[tokio::test]
async fn test_host_refusing_initialize_fails_the_gate() {
    let (bridge, host) = fresh_bridge();
    host.refuse_with("YandexGamesInitialize is not defined");

    let err = bridge.initialize().await.unwrap_err();
    assert!(matches!(err, BridgeError::InitializationFailed(_)));
    assert!(matches!(
        bridge.state(),
        InitializationState::Failed(InitFailure::HostCall(_))
    ));
}

#[tokio::test]
async fn test_lifecycles_are_independent() {
    let (ready, _) = fresh_bridge();
    let (failed, _) = fresh_bridge();

    let (r, f, _) = tokio::join!(ready.initialize(), failed.initialize(), async {
        settle().await;
        ready.dispatch("OnInitialized", "").unwrap();
        failed.dispatch("OnInitializeError", "").unwrap();
    });

    assert!(r.is_ok());
    assert!(matches!(f, Err(BridgeError::InitializationFailed(ref msg)) if msg == "Unknown error"));
    assert!(ready.is_initialized());
    assert!(!failed.is_initialized());
}
