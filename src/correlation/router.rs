// ============================================================================
// Callback Router
// ============================================================================
//
// The host invokes bridge entry points by channel name with one string
// argument. The router owns a fixed table, built once, from channel name to
// handler closure. Each operation handler:
// 1. tries to read the kind's key field out of a JSON envelope
// 2. on success settles that exact request
// 3. otherwise falls back to positional matching (legacy payloads)
//
// Callbacks that match nothing are reported as `RouteOutcome::Unroutable`
// and logged; they never reach a caller and never settle anything.
//
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::registry::{KeyedMatch, PendingRequestRegistry, PositionalMatch, Rejection, Settlement};
use super::CorrelationKey;
use crate::core::{ChannelRole, OperationKind, Result};
use crate::gate::{INITIALIZE_ERROR_CHANNEL, INITIALIZED_CHANNEL, InitFailure, InitializationGate};

const UNKNOWN_ERROR: &str = "Unknown error";

/// Parsed shape of a callback payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackEnvelope {
    /// Current form: the correlation key travels with the body
    Keyed { key: String, body: Option<String> },
    /// Legacy form: the whole payload is the value (or the error message)
    Bare(String),
}

impl CallbackEnvelope {
    pub fn parse(kind: OperationKind, role: ChannelRole, raw: &str) -> Self {
        let Some(field) = kind.key_field().field_name() else {
            return CallbackEnvelope::Bare(raw.to_string());
        };

        let Ok(Value::Object(mut object)) = serde_json::from_str::<Value>(raw) else {
            return CallbackEnvelope::Bare(raw.to_string());
        };

        let key = match object.remove(field) {
            Some(Value::String(key)) => key,
            _ => return CallbackEnvelope::Bare(raw.to_string()),
        };

        let body_field = match role {
            ChannelRole::Completion => "data",
            ChannelRole::Failure => "error",
        };
        let body = match object.remove(body_field) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            // Hosts that inline the JSON rather than stringifying it
            Some(other) => Some(other.to_string()),
        };

        CallbackEnvelope::Keyed { key, body }
    }
}

/// Why a callback could not be delivered to any caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnroutableReason {
    UnknownChannel(String),
    /// Nothing pending under the key (late or duplicate callback)
    NoPendingRequest {
        kind: OperationKind,
        key: Option<String>,
    },
    /// Answer to a request whose callers already timed out
    LateAfterTimeout { kind: OperationKind, key: String },
    /// Un-keyed payload while several requests of the kind are outstanding
    Ambiguous {
        kind: OperationKind,
        candidates: usize,
    },
    /// Initialization callback outside of an initialization attempt
    InitializationNotInFlight,
}

impl std::fmt::Display for UnroutableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnroutableReason::UnknownChannel(name) => write!(f, "unknown channel '{name}'"),
            UnroutableReason::NoPendingRequest { kind, key: Some(key) } => {
                write!(f, "no pending '{kind}' request for key '{key}'")
            }
            UnroutableReason::NoPendingRequest { kind, key: None } => {
                write!(f, "no pending '{kind}' request")
            }
            UnroutableReason::LateAfterTimeout { kind, key } => {
                write!(f, "late '{kind}' callback for timed-out key '{key}'")
            }
            UnroutableReason::Ambiguous { kind, candidates } => write!(
                f,
                "un-keyed '{kind}' callback with {candidates} requests outstanding"
            ),
            UnroutableReason::InitializationNotInFlight => {
                write!(f, "initialization callback while no initialization is in flight")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Matched through the envelope's key field
    Settled { kind: OperationKind, key: String },
    /// Matched as the only outstanding request of its kind
    SettledPositional {
        kind: OperationKind,
        key: CorrelationKey,
    },
    /// Moved the initialization gate to a terminal state
    Initialization,
    Unroutable(UnroutableReason),
}

impl RouteOutcome {
    pub fn is_settled(&self) -> bool {
        !matches!(self, RouteOutcome::Unroutable(_))
    }
}

type ChannelHandler = Box<dyn Fn(&str) -> Result<RouteOutcome> + Send + Sync>;

pub struct CallbackRouter {
    handlers: HashMap<&'static str, ChannelHandler>,
}

impl CallbackRouter {
    pub fn new(registry: Arc<PendingRequestRegistry>, gate: Arc<InitializationGate>) -> Self {
        let mut handlers: HashMap<&'static str, ChannelHandler> = HashMap::new();

        for kind in OperationKind::ALL {
            for role in [ChannelRole::Completion, ChannelRole::Failure] {
                let registry = Arc::clone(&registry);
                handlers.insert(
                    kind.channel(role),
                    Box::new(move |payload| route_operation(&registry, kind, role, payload)),
                );
            }
        }

        let ready_gate = Arc::clone(&gate);
        handlers.insert(
            INITIALIZED_CHANNEL,
            Box::new(move |_| Ok(initialization_outcome(ready_gate.mark_ready()))),
        );
        handlers.insert(
            INITIALIZE_ERROR_CHANNEL,
            Box::new(move |payload| {
                let message = if payload.is_empty() { UNKNOWN_ERROR } else { payload };
                Ok(initialization_outcome(
                    gate.mark_failed(InitFailure::Platform(message.to_string())),
                ))
            }),
        );

        Self { handlers }
    }

    /// Entry point for the host: deliver `payload` on `channel`
    pub fn dispatch(&self, channel: &str, payload: &str) -> Result<RouteOutcome> {
        let outcome = match self.handlers.get(channel) {
            Some(handler) => handler(payload)?,
            None => RouteOutcome::Unroutable(UnroutableReason::UnknownChannel(channel.to_string())),
        };

        match &outcome {
            RouteOutcome::Unroutable(reason) => {
                warn!(channel, %reason, "unroutable callback dropped");
            }
            settled => debug!(channel, outcome = ?settled, "callback routed"),
        }
        Ok(outcome)
    }
}

fn initialization_outcome(transitioned: bool) -> RouteOutcome {
    if transitioned {
        RouteOutcome::Initialization
    } else {
        RouteOutcome::Unroutable(UnroutableReason::InitializationNotInFlight)
    }
}

fn settlement_for(role: ChannelRole, body: Option<String>) -> Settlement {
    match role {
        ChannelRole::Completion => Ok(body),
        ChannelRole::Failure => Err(Rejection::Platform(
            body.filter(|m| !m.is_empty())
                .unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
        )),
    }
}

fn route_operation(
    registry: &PendingRequestRegistry,
    kind: OperationKind,
    role: ChannelRole,
    payload: &str,
) -> Result<RouteOutcome> {
    match CallbackEnvelope::parse(kind, role, payload) {
        CallbackEnvelope::Keyed { key, body } => {
            let reason = match registry.settle(kind, &key, settlement_for(role, body))? {
                KeyedMatch::Settled => return Ok(RouteOutcome::Settled { kind, key }),
                KeyedMatch::LateAfterTimeout => UnroutableReason::LateAfterTimeout { kind, key },
                KeyedMatch::NoRequest => UnroutableReason::NoPendingRequest {
                    kind,
                    key: Some(key),
                },
            };
            Ok(RouteOutcome::Unroutable(reason))
        }
        CallbackEnvelope::Bare(raw) => {
            match registry.settle_positional(kind, settlement_for(role, Some(raw)))? {
                PositionalMatch::Settled(key) => Ok(RouteOutcome::SettledPositional { kind, key }),
                PositionalMatch::LateAfterTimeout(key) => {
                    Ok(RouteOutcome::Unroutable(UnroutableReason::LateAfterTimeout {
                        kind,
                        key: key.wire(),
                    }))
                }
                PositionalMatch::NoCandidate => {
                    Ok(RouteOutcome::Unroutable(UnroutableReason::NoPendingRequest {
                        kind,
                        key: None,
                    }))
                }
                PositionalMatch::Ambiguous(candidates) => {
                    Ok(RouteOutcome::Unroutable(UnroutableReason::Ambiguous { kind, candidates }))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::InitializationState;

    fn router() -> (CallbackRouter, Arc<PendingRequestRegistry>, Arc<InitializationGate>) {
        let registry = Arc::new(PendingRequestRegistry::new());
        let gate = Arc::new(InitializationGate::new());
        let router = CallbackRouter::new(Arc::clone(&registry), Arc::clone(&gate));
        (router, registry, gate)
    }

    #[test]
    fn test_parse_keyed_envelopes() {
        let env = CallbackEnvelope::parse(
            OperationKind::LoadData,
            ChannelRole::Completion,
            r#"{"key":"slotB","data":"X"}"#,
        );
        assert_eq!(
            env,
            CallbackEnvelope::Keyed {
                key: "slotB".into(),
                body: Some("X".into())
            }
        );

        let env = CallbackEnvelope::parse(
            OperationKind::SetLeaderboardScore,
            ChannelRole::Failure,
            r#"{"leaderboardName":"weekly","error":"boom"}"#,
        );
        assert_eq!(
            env,
            CallbackEnvelope::Keyed {
                key: "weekly".into(),
                body: Some("boom".into())
            }
        );

        let env = CallbackEnvelope::parse(
            OperationKind::Flags,
            ChannelRole::Completion,
            r#"{"requestKey":"flags:{}","data":{"a":"1"}}"#,
        );
        assert_eq!(
            env,
            CallbackEnvelope::Keyed {
                key: "flags:{}".into(),
                body: Some(r#"{"a":"1"}"#.into())
            }
        );
    }

    #[test]
    fn test_parse_legacy_payloads() {
        for raw in ["plain text", "[1,2]", r#"{"data":"no key"}"#, r#"{"key":5}"#, ""] {
            let env = CallbackEnvelope::parse(OperationKind::LoadData, ChannelRole::Completion, raw);
            assert_eq!(env, CallbackEnvelope::Bare(raw.to_string()), "payload {raw:?}");
        }

        // Positional kinds never look for a key, even if one is present
        let raw = r#"{"key":"x","name":"Test Player"}"#;
        let env = CallbackEnvelope::parse(OperationKind::PlayerData, ChannelRole::Completion, raw);
        assert_eq!(env, CallbackEnvelope::Bare(raw.to_string()));
    }

    #[tokio::test]
    async fn test_keyed_callback_settles_only_its_key() {
        let (router, registry, _) = router();
        let mut a = registry
            .acquire_or_join(OperationKind::LoadData, &CorrelationKey::explicit("slotA"), None)
            .unwrap()
            .into_handle();
        let mut b = registry
            .acquire_or_join(OperationKind::LoadData, &CorrelationKey::explicit("slotB"), None)
            .unwrap()
            .into_handle();

        let outcome = router
            .dispatch("OnLoadDataComplete", r#"{"key":"slotB","data":"X"}"#)
            .unwrap();
        assert_eq!(
            outcome,
            RouteOutcome::Settled {
                kind: OperationKind::LoadData,
                key: "slotB".into()
            }
        );
        assert_eq!(b.settled().await, Some(Ok(Some("X".to_string()))));
        assert!(a.try_settled().is_none());
    }

    #[tokio::test]
    async fn test_error_channel_rejects() {
        let (router, registry, _) = router();
        let mut handle = registry
            .acquire_or_join(OperationKind::Purchases, &CorrelationKey::Singleton, None)
            .unwrap()
            .into_handle();

        let outcome = router
            .dispatch("OnGetPurchasesError", "USER_NOT_AUTHORIZED")
            .unwrap();
        assert!(outcome.is_settled());
        assert_eq!(
            handle.settled().await,
            Some(Err(Rejection::Platform("USER_NOT_AUTHORIZED".into())))
        );
    }

    #[test]
    fn test_late_keyed_callback_is_unroutable() {
        let (router, _, _) = router();
        let outcome = router
            .dispatch("OnSaveDataComplete", r#"{"key":"slot"}"#)
            .unwrap();
        assert_eq!(
            outcome,
            RouteOutcome::Unroutable(UnroutableReason::NoPendingRequest {
                kind: OperationKind::SaveData,
                key: Some("slot".into())
            })
        );
    }

    #[test]
    fn test_unknown_channel() {
        let (router, _, _) = router();
        let outcome = router.dispatch("OnSomethingElse", "x").unwrap();
        assert_eq!(
            outcome,
            RouteOutcome::Unroutable(UnroutableReason::UnknownChannel("OnSomethingElse".into()))
        );
    }

    #[test]
    fn test_every_operation_channel_registered() {
        let (router, _, _) = router();
        for kind in OperationKind::ALL {
            assert!(router.handlers.contains_key(kind.completion_channel()));
            assert!(router.handlers.contains_key(kind.error_channel()));
        }
        assert!(router.handlers.contains_key(INITIALIZED_CHANNEL));
        assert!(router.handlers.contains_key(INITIALIZE_ERROR_CHANNEL));
        assert_eq!(router.handlers.len(), OperationKind::ALL.len() * 2 + 2);
    }

    #[test]
    fn test_initialization_channels_drive_gate() {
        let (router, _, gate) = router();

        // Not begun yet: nothing to settle
        let outcome = router.dispatch(INITIALIZED_CHANNEL, "").unwrap();
        assert!(!outcome.is_settled());
        assert_eq!(gate.state(), InitializationState::Uninitialized);

        assert!(gate.begin());
        let outcome = router.dispatch(INITIALIZE_ERROR_CHANNEL, "sdk missing").unwrap();
        assert_eq!(outcome, RouteOutcome::Initialization);
        assert_eq!(
            gate.state(),
            InitializationState::Failed(InitFailure::Platform("sdk missing".into()))
        );

        // Terminal: a late ready signal changes nothing
        let outcome = router.dispatch(INITIALIZED_CHANNEL, "").unwrap();
        assert!(!outcome.is_settled());
        assert!(matches!(gate.state(), InitializationState::Failed(_)));
    }
}
