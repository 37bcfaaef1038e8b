#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use yandex_games_bridge::{
    Bridge, BridgeConfig, HostCall, HostError, HostPlatform, InitializationGate, OperationKind,
};

/// Host that records every call and never answers on its own
#[derive(Default)]
pub struct RecordingHost {
    calls: Mutex<Vec<HostCall>>,
    refuse_with: Mutex<Option<String>>,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, kind: OperationKind) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.kind() == Some(kind))
            .count()
    }

    pub fn initialize_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| **call == HostCall::Initialize)
            .count()
    }

    /// Make every following call throw synchronously
    pub fn refuse_with(&self, message: &str) {
        *self.refuse_with.lock().unwrap() = Some(message.to_string());
    }

    pub fn last_call(&self) -> Option<HostCall> {
        self.calls().last().cloned()
    }
}

impl HostPlatform for RecordingHost {
    fn invoke(&self, call: &HostCall) -> Result<(), HostError> {
        self.calls.lock().unwrap().push(call.clone());
        match self.refuse_with.lock().unwrap().as_deref() {
            Some(message) => Err(HostError::new(message)),
            None => Ok(()),
        }
    }
}

/// Bridge over a recording host with the gate already open
pub fn ready_bridge() -> (Bridge, Arc<RecordingHost>) {
    ready_bridge_with(BridgeConfig::default())
}

pub fn ready_bridge_with(config: BridgeConfig) -> (Bridge, Arc<RecordingHost>) {
    let host = RecordingHost::new();
    let gate = Arc::new(InitializationGate::new());
    gate.begin();
    gate.mark_ready();
    let bridge = Bridge::with_gate(host.clone(), config, gate).unwrap();
    (bridge, host)
}

/// Let every other branch of the current task reach its first await point
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
