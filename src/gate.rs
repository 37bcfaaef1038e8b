// ============================================================================
// Initialization Gate
// ============================================================================
//
// State machine guarding every operation until the platform SDK is ready:
//
// ```text
// Uninitialized ──begin──> Initializing ──OnInitialized──> Ready
//                               │
//                               └──OnInitializeError / timeout──> Failed
// ```
//
// Ready and Failed are terminal for the lifetime of the gate. There is no
// automatic retry after Failed; the embedding application decides that.
//
// ============================================================================

use std::fmt;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::core::{BridgeError, Result};
use crate::host::HostError;

/// Channel the platform invokes once the SDK is ready
pub const INITIALIZED_CHANNEL: &str = "OnInitialized";
/// Channel the platform invokes when the SDK failed to start
pub const INITIALIZE_ERROR_CHANNEL: &str = "OnInitializeError";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitFailure {
    /// Reported on the initialization error channel
    Platform(String),
    /// The host refused the initialization call itself
    HostCall(String),
    /// Neither callback arrived in time
    TimedOut(Duration),
}

impl fmt::Display for InitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitFailure::Platform(msg) => write!(f, "platform error: {msg}"),
            InitFailure::HostCall(msg) => write!(f, "host call failed: {msg}"),
            InitFailure::TimedOut(after) => write!(f, "timed out after {after:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InitializationState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    Failed(InitFailure),
}

impl InitializationState {
    pub fn is_ready(&self) -> bool {
        matches!(self, InitializationState::Ready)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InitializationState::Ready | InitializationState::Failed(_)
        )
    }

    fn into_result(self) -> Result<()> {
        match self {
            InitializationState::Ready => Ok(()),
            InitializationState::Failed(InitFailure::TimedOut(after)) => {
                Err(BridgeError::InitializationTimeout(after))
            }
            InitializationState::Failed(InitFailure::Platform(msg))
            | InitializationState::Failed(InitFailure::HostCall(msg)) => {
                Err(BridgeError::InitializationFailed(msg))
            }
            other => Err(BridgeError::NotInitialized(other)),
        }
    }
}

impl fmt::Display for InitializationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitializationState::Uninitialized => write!(f, "UNINITIALIZED"),
            InitializationState::Initializing => write!(f, "INITIALIZING"),
            InitializationState::Ready => write!(f, "READY"),
            InitializationState::Failed(reason) => write!(f, "FAILED ({reason})"),
        }
    }
}

/// Shared initialization state.
///
/// Create one per simulated lifecycle and hand it to the bridge; nothing here
/// is process-global.
pub struct InitializationGate {
    state: watch::Sender<InitializationState>,
}

impl Default for InitializationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl InitializationGate {
    pub fn new() -> Self {
        let (state, _) = watch::channel(InitializationState::Uninitialized);
        Self { state }
    }

    pub fn state(&self) -> InitializationState {
        self.state.borrow().clone()
    }

    /// Observe state transitions
    pub fn subscribe(&self) -> watch::Receiver<InitializationState> {
        self.state.subscribe()
    }

    /// Claim the single initialization attempt. Returns `false` if an attempt
    /// was already made.
    pub fn begin(&self) -> bool {
        self.transition(|s| {
            matches!(s, InitializationState::Uninitialized).then_some(InitializationState::Initializing)
        })
    }

    pub fn mark_ready(&self) -> bool {
        let moved = self.transition(|s| {
            matches!(s, InitializationState::Initializing).then_some(InitializationState::Ready)
        });
        if moved {
            info!("platform SDK ready");
        }
        moved
    }

    pub fn mark_failed(&self, failure: InitFailure) -> bool {
        let moved = self.transition(|s| {
            matches!(s, InitializationState::Initializing)
                .then(|| InitializationState::Failed(failure.clone()))
        });
        if moved {
            warn!(%failure, "platform SDK initialization failed");
        }
        moved
    }

    /// Fail fast unless the gate is open
    pub fn ensure_ready(&self) -> Result<()> {
        let state = self.state.borrow();
        if state.is_ready() {
            Ok(())
        } else {
            Err(BridgeError::NotInitialized(state.clone()))
        }
    }

    /// Wait until the gate reaches Ready or Failed
    pub async fn wait_settled(&self) -> InitializationState {
        let mut rx = self.subscribe();
        match rx.wait_for(InitializationState::is_terminal).await {
            Ok(state) => state.clone(),
            // The sender lives in `self`, so this arm is unreachable in practice
            Err(_) => self.state(),
        }
    }

    /// Run the initialization protocol.
    ///
    /// The first caller issues `start` (the fire-and-forget host call); later
    /// callers only wait. A synchronous failure from `start` or an elapsed
    /// `timeout` moves the gate to Failed. Once terminal, returns immediately.
    pub async fn initialize_with<F>(&self, timeout: Duration, start: F) -> Result<()>
    where
        F: FnOnce() -> std::result::Result<(), HostError>,
    {
        if self.begin() {
            info!(?timeout, "initializing platform SDK");
            if let Err(err) = start() {
                self.mark_failed(InitFailure::HostCall(err.to_string()));
            }
        }

        let state = match tokio::time::timeout(timeout, self.wait_settled()).await {
            Ok(state) => state,
            Err(_) => {
                self.mark_failed(InitFailure::TimedOut(timeout));
                // A callback may have won the race; report whatever stuck
                self.state()
            }
        };
        state.into_result()
    }

    fn transition<F>(&self, next: F) -> bool
    where
        F: FnOnce(&InitializationState) -> Option<InitializationState>,
    {
        self.state.send_if_modified(|state| match next(state) {
            Some(new_state) => {
                *state = new_state;
                true
            }
            None => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_transitions_are_one_way() {
        let gate = InitializationGate::new();
        assert_eq!(gate.state(), InitializationState::Uninitialized);
        assert!(!gate.mark_ready());

        assert!(gate.begin());
        assert!(!gate.begin());
        assert_eq!(gate.state(), InitializationState::Initializing);

        assert!(gate.mark_ready());
        assert!(!gate.mark_failed(InitFailure::Platform("late".into())));
        assert!(!gate.begin());
        assert_eq!(gate.state(), InitializationState::Ready);
    }

    #[test]
    fn test_ensure_ready_reports_state() {
        let gate = InitializationGate::new();
        let err = gate.ensure_ready().unwrap_err();
        assert!(matches!(
            err,
            BridgeError::NotInitialized(InitializationState::Uninitialized)
        ));

        gate.begin();
        assert!(matches!(
            gate.ensure_ready().unwrap_err(),
            BridgeError::NotInitialized(InitializationState::Initializing)
        ));

        gate.mark_ready();
        assert!(gate.ensure_ready().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_initialize_times_out() {
        let gate = InitializationGate::new();
        let result = gate
            .initialize_with(Duration::from_secs(10), || Ok(()))
            .await;

        assert!(matches!(result, Err(BridgeError::InitializationTimeout(d)) if d == Duration::from_secs(10)));
        assert_eq!(
            gate.state(),
            InitializationState::Failed(InitFailure::TimedOut(Duration::from_secs(10)))
        );

        // No retry after failure
        let mut calls = 0;
        let again = gate
            .initialize_with(Duration::from_secs(10), || {
                calls += 1;
                Ok(())
            })
            .await;
        assert!(again.is_err());
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn test_host_call_failure_fails_gate() {
        let gate = InitializationGate::new();
        let result = gate
            .initialize_with(Duration::from_secs(10), || {
                Err(HostError::new("YandexGamesInitialize is not defined"))
            })
            .await;
        assert!(matches!(result, Err(BridgeError::InitializationFailed(msg)) if msg.contains("not defined")));
    }

    #[tokio::test]
    async fn test_concurrent_initializers_share_outcome() {
        let gate = Arc::new(InitializationGate::new());
        let mut starts = 0;

        let g = Arc::clone(&gate);
        let first = tokio::spawn(async move {
            g.initialize_with(Duration::from_secs(10), || Ok(())).await
        });
        gate.subscribe()
            .wait_for(|s| *s == InitializationState::Initializing)
            .await
            .unwrap();

        // Callers arriving while Initializing or Ready issue nothing
        let g = Arc::clone(&gate);
        let second = tokio::spawn(async move {
            g.initialize_with(Duration::from_secs(10), || Ok(())).await
        });
        gate.mark_ready();
        let third = gate
            .initialize_with(Duration::from_secs(10), || {
                starts += 1;
                Ok(())
            })
            .await;
        assert!(third.is_ok());
        assert_eq!(starts, 0);

        assert!(first.await.unwrap().is_ok());
        assert!(second.await.unwrap().is_ok());
    }
}
