// ============================================================================
// Operation Façade
// ============================================================================
//
// `Bridge` turns every platform capability into an awaitable method. Each
// call walks the same path:
//
// ```text
// validate -> gate check -> acquire_or_join -> (new) host call -> await -> decode
// ```
//
// Joiners never touch the host. A synchronous host failure rejects the
// request it just registered, so joiners see the same failure.
//
// ============================================================================

mod ads;
mod leaderboards;
mod payments;
mod player;
mod remote_config;
mod review;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{Instrument, Level, debug, event, info_span};

use crate::config::BridgeConfig;
use crate::core::{BridgeError, OperationKind, Result};
use crate::correlation::{
    Acquisition, CallbackRouter, CorrelationKey, PendingHandle, PendingRequestRegistry,
    Rejection, RouteOutcome, Settlement,
};
use crate::gate::{InitializationGate, InitializationState};
use crate::host::{HostCall, HostPlatform};
use crate::mock::{MockConfig, MockHost};

struct BridgeShared {
    config: BridgeConfig,
    host: Arc<dyn HostPlatform>,
    registry: Arc<PendingRequestRegistry>,
    gate: Arc<InitializationGate>,
    router: CallbackRouter,
}

/// Awaitable front of the platform SDK.
///
/// Cheap to clone; clones share the registry, gate and host.
///
/// # Examples
///
/// ```
/// use yandex_games_bridge::{Bridge, BridgeConfig, MockConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bridge = Bridge::offline(BridgeConfig::default(), MockConfig::instant()).await?;
/// bridge.initialize().await?;
///
/// bridge.save_data("progress", r#"{"level":3}"#).await?;
/// let saved = bridge.load_data("progress").await?;
/// assert_eq!(saved.as_deref(), Some(r#"{"level":3}"#));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Bridge {
    shared: Arc<BridgeShared>,
}

/// Everything one façade call needs to enter the registry and reach the host
struct OperationRequest {
    kind: OperationKind,
    key: CorrelationKey,
    /// Arguments not captured by the key; differing fingerprints never merge
    fingerprint: Option<String>,
    call: HostCall,
}

impl OperationRequest {
    fn new(kind: OperationKind, key: CorrelationKey, call: HostCall) -> Self {
        Self {
            kind,
            key,
            fingerprint: None,
            call,
        }
    }

    fn singleton(kind: OperationKind, call: HostCall) -> Self {
        Self::new(kind, CorrelationKey::Singleton, call)
    }

    fn fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }
}

impl Bridge {
    pub fn new(host: Arc<dyn HostPlatform>, config: BridgeConfig) -> Result<Self> {
        Self::with_gate(host, config, Arc::new(InitializationGate::new()))
    }

    /// Build a bridge around an existing gate, e.g. one shared with other
    /// components of the same lifecycle
    pub fn with_gate(
        host: Arc<dyn HostPlatform>,
        config: BridgeConfig,
        gate: Arc<InitializationGate>,
    ) -> Result<Self> {
        config.validate().map_err(BridgeError::Validation)?;

        let registry = Arc::new(PendingRequestRegistry::new());
        let router = CallbackRouter::new(Arc::clone(&registry), Arc::clone(&gate));

        Ok(Self {
            shared: Arc::new(BridgeShared {
                config,
                host,
                registry,
                gate,
                router,
            }),
        })
    }

    /// Bridge backed by the in-process [`MockHost`].
    ///
    /// The mock's callbacks are pumped into [`Bridge::dispatch`] by a task on
    /// the current Tokio runtime; the task ends once every clone of the
    /// bridge is dropped.
    pub async fn offline(config: BridgeConfig, mock: MockConfig) -> Result<Self> {
        let (host, mut deliveries) = MockHost::new(mock);
        let bridge = Self::new(Arc::new(host), config)?;

        let shared = Arc::downgrade(&bridge.shared);
        tokio::spawn(async move {
            while let Some(delivery) = deliveries.recv().await {
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                if let Err(err) = shared.router.dispatch(delivery.channel, &delivery.payload) {
                    event!(Level::ERROR, error = %err, channel = delivery.channel, "offline delivery failed");
                }
            }
        });

        Ok(bridge)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.shared.config
    }

    pub fn state(&self) -> InitializationState {
        self.shared.gate.state()
    }

    pub fn is_initialized(&self) -> bool {
        self.state().is_ready()
    }

    pub fn gate(&self) -> &Arc<InitializationGate> {
        &self.shared.gate
    }

    /// Requests registered and not yet settled
    pub fn pending_count(&self) -> Result<usize> {
        self.shared.registry.pending_count()
    }

    pub fn pending_of(&self, kind: OperationKind) -> Result<usize> {
        self.shared.registry.pending_of(kind)
    }

    /// Start the SDK and wait until it is ready.
    ///
    /// Only the first call reaches the host. Later calls wait for the same
    /// outcome, and once Ready or Failed they return it immediately.
    pub async fn initialize(&self) -> Result<()> {
        let host = Arc::clone(&self.shared.host);
        self.shared
            .gate
            .initialize_with(self.shared.config.init_timeout, move || {
                host.invoke(&HostCall::Initialize)
            })
            .instrument(info_span!("bridge.initialize"))
            .await
    }

    /// Deliver a host callback: `payload` arrived on the channel named
    /// `channel`
    pub fn dispatch(&self, channel: &str, payload: &str) -> Result<RouteOutcome> {
        self.shared.router.dispatch(channel, payload)
    }

    async fn call<T, F>(&self, request: OperationRequest, decode: F) -> Result<T>
    where
        F: FnOnce(Option<String>) -> Result<T>,
    {
        let OperationRequest {
            kind,
            key,
            fingerprint,
            call,
        } = request;
        self.shared.gate.ensure_ready()?;

        let span = info_span!("bridge.call", operation = %kind, key = %key);
        let settlement = self
            .settle_call(kind, &key, fingerprint.as_deref(), &call)
            .instrument(span)
            .await?;

        match settlement {
            Ok(body) => decode(body),
            Err(rejection) => {
                let err = rejection_error(kind, rejection);
                event!(Level::WARN, error = %err, key = %key, "operation failed");
                Err(err)
            }
        }
    }

    async fn settle_call(
        &self,
        kind: OperationKind,
        key: &CorrelationKey,
        fingerprint: Option<&str>,
        call: &HostCall,
    ) -> Result<Settlement> {
        let registry = &self.shared.registry;
        loop {
            let mut handle = match registry.acquire_or_join(kind, key, fingerprint)? {
                Acquisition::New(handle) => {
                    debug!(entry_point = call.entry_point(), request = %handle.ticket().id, "issuing host call");
                    if let Err(err) = self.shared.host.invoke(call) {
                        registry.settle_request(
                            handle.ticket(),
                            Err(Rejection::HostCall(err.to_string())),
                        )?;
                    }
                    handle
                }
                Acquisition::Joined(handle) => handle,
                Acquisition::Busy(mut handle) => {
                    // Whatever the outcome, retry against the freed or lapsed slot
                    let _ = self.await_settlement(kind, &mut handle).await;
                    continue;
                }
            };
            return self.await_settlement(kind, &mut handle).await;
        }
    }

    async fn await_settlement(
        &self,
        kind: OperationKind,
        handle: &mut PendingHandle,
    ) -> Result<Settlement> {
        let Some(limit) = self.shared.config.request_timeout else {
            return handle.settled().await.ok_or(BridgeError::Abandoned(kind));
        };

        let outcome = tokio::time::timeout(limit, handle.settled()).await;
        match outcome {
            Ok(settlement) => settlement.ok_or(BridgeError::Abandoned(kind)),
            Err(_) => {
                // The host call is still in flight; its late answer must not
                // reach a newer request under this key
                self.shared
                    .registry
                    .expire_request(handle.ticket(), limit, limit)?;
                // A callback may have settled it first; report whatever stuck
                Ok(handle
                    .try_settled()
                    .unwrap_or(Err(Rejection::TimedOut(limit))))
            }
        }
    }
}

fn rejection_error(operation: OperationKind, rejection: Rejection) -> BridgeError {
    match rejection {
        Rejection::Platform(message) => BridgeError::Platform { operation, message },
        Rejection::HostCall(message) => BridgeError::HostCall { operation, message },
        Rejection::TimedOut(timeout) => BridgeError::RequestTimeout { operation, timeout },
    }
}

// ============================================================================
// Argument validation and payload decoding shared by the operation modules
// ============================================================================

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BridgeError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn require_body(operation: OperationKind, body: Option<String>) -> Result<String> {
    body.ok_or_else(|| BridgeError::deserialization(operation, "empty payload"))
}

fn decode_json<T: DeserializeOwned>(operation: OperationKind, body: Option<String>) -> Result<T> {
    let raw = require_body(operation, body)?;
    serde_json::from_str(&raw).map_err(|e| BridgeError::deserialization(operation, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::host::HostError;

    #[derive(Default)]
    struct ScriptedHost {
        calls: Mutex<Vec<HostCall>>,
        refuse: bool,
    }

    impl HostPlatform for ScriptedHost {
        fn invoke(&self, call: &HostCall) -> std::result::Result<(), HostError> {
            self.calls.lock().unwrap().push(call.clone());
            if self.refuse {
                Err(HostError::new("entry point missing"))
            } else {
                Ok(())
            }
        }
    }

    fn ready_bridge(host: Arc<ScriptedHost>, config: BridgeConfig) -> Bridge {
        let gate = Arc::new(InitializationGate::new());
        gate.begin();
        gate.mark_ready();
        Bridge::with_gate(host, config, gate).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let host = Arc::new(ScriptedHost::default());
        let result = Bridge::new(host, BridgeConfig::new().init_timeout(Duration::ZERO));
        assert!(matches!(result, Err(BridgeError::Validation(_))));
    }

    #[tokio::test]
    async fn test_host_refusal_rejects_request() {
        let host = Arc::new(ScriptedHost {
            refuse: true,
            ..Default::default()
        });
        let bridge = ready_bridge(Arc::clone(&host), BridgeConfig::default());

        let err = bridge.get_catalog().await.unwrap_err();
        assert!(matches!(
            err,
            BridgeError::HostCall {
                operation: OperationKind::Catalog,
                ..
            }
        ));
        assert_eq!(bridge.pending_count().unwrap(), 0);
        assert_eq!(host.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_timeout_settles_for_all_waiters() {
        let host = Arc::new(ScriptedHost::default());
        let bridge = ready_bridge(
            Arc::clone(&host),
            BridgeConfig::new().request_timeout(Duration::from_secs(5)),
        );

        let (a, b) = tokio::join!(bridge.get_player_data(), bridge.get_player_data());
        for result in [a, b] {
            assert!(matches!(
                result,
                Err(BridgeError::RequestTimeout {
                    operation: OperationKind::PlayerData,
                    ..
                })
            ));
        }
        assert_eq!(host.calls.lock().unwrap().len(), 1);
        assert_eq!(bridge.pending_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_decode_helpers() {
        assert!(matches!(
            require_body(OperationKind::Catalog, None),
            Err(BridgeError::Deserialization { .. })
        ));
        let err = decode_json::<Vec<u32>>(OperationKind::Catalog, Some("{oops".into())).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Deserialization {
                operation: OperationKind::Catalog,
                ..
            }
        ));
        assert!(require_non_empty("key", "  ").is_err());
    }
}
