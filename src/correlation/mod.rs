// ============================================================================
// Request/Response Correlation
// ============================================================================
//
// Ties fire-and-forget host calls to the callbacks that answer them:
// - key:      how a logical request is identified
// - registry: outstanding requests, joined and settled exactly once
// - router:   named channel -> envelope parsing -> registry
//
// ============================================================================

pub mod key;
pub mod registry;
pub mod router;

pub use crate::core::KeyField;
pub use key::{CorrelationKey, canonical_json};
pub use registry::{
    Acquisition, KeyedMatch, PendingHandle, PendingRequestRegistry, PositionalMatch, Rejection,
    RequestId, RequestTicket, Settlement,
};
pub use router::{CallbackEnvelope, CallbackRouter, RouteOutcome, UnroutableReason};
