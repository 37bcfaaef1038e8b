// ============================================================================
// Yandex Games Bridge Library
// ============================================================================

pub mod config;
pub mod core;
pub mod correlation;
pub mod facade;
pub mod gate;
pub mod host;
pub mod mock;
pub mod models;

// Re-export main types for convenience
pub use config::BridgeConfig;
pub use core::{BridgeError, ChannelRole, OperationKind, Result};
pub use correlation::{CorrelationKey, RouteOutcome, UnroutableReason};
pub use facade::Bridge;
pub use gate::{InitFailure, InitializationGate, InitializationState};
pub use host::{HostCall, HostError, HostPlatform};
pub use mock::{MockConfig, MockHost};
