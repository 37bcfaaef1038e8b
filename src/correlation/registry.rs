// ============================================================================
// Pending Request Registry
// ============================================================================
//
// Maps (operation kind, correlation key) to the one outstanding request for
// that pair. Every caller that shares the pair waits on the same request and
// observes the same settlement.
//
// Invariants:
// - an entry stays until a callback, a synchronous host failure or a timeout
//   settles it; callers going away never remove it, because its host call
//   is still in flight and will answer under the same key
// - settling removes the entry under the same lock that delivers the value,
//   so a request can never be settled twice
// - a timed-out entry is kept as a reservation that swallows the late
//   callback; it lapses after the hold period
// - settling an absent entry is a no-op, never an error
//
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::debug;

use super::CorrelationKey;
use crate::core::{OperationKind, Result};

/// Outcome delivered to every caller of a pending request.
///
/// `Ok(None)` is a completion that carried no data (e.g. a save acknowledgement).
pub type Settlement = std::result::Result<Option<String>, Rejection>;

/// Why a pending request failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Reported by the platform on the error channel; message kept verbatim
    Platform(String),
    /// The host refused the fire-and-forget call synchronously
    HostCall(String),
    /// No callback arrived within the configured request timeout
    TimedOut(Duration),
}

/// Unique identity of one registered request (distinct from its key, which
/// is reused by later requests)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req_{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Slot {
    kind: OperationKind,
    wire: String,
}

impl Slot {
    fn new(kind: OperationKind, wire: impl Into<String>) -> Self {
        Self {
            kind,
            wire: wire.into(),
        }
    }
}

struct PendingRequest {
    id: RequestId,
    key: CorrelationKey,
    /// Canonical call arguments; joiners must match it to share the outcome
    fingerprint: Option<String>,
    waiters: Vec<oneshot::Sender<Settlement>>,
    registered_at: Instant,
    /// Set once the request timed out: its callers are gone but the host
    /// call may still answer before this instant
    reserved_until: Option<Instant>,
}

impl PendingRequest {
    fn settle(self, settlement: Settlement) {
        debug!(
            request = %self.id,
            key = %self.key,
            waiters = self.waiters.len(),
            elapsed_ms = self.registered_at.elapsed().as_millis() as u64,
            ok = settlement.is_ok(),
            "settling pending request"
        );
        for waiter in self.waiters {
            // A waiter that went away simply misses the value
            let _ = waiter.send(settlement.clone());
        }
    }

    fn is_reserved(&self) -> bool {
        self.reserved_until.is_some()
    }

    fn has_lapsed(&self, now: Instant) -> bool {
        self.reserved_until.is_some_and(|until| now >= until)
    }
}

/// Addresses one specific registered request, not merely its key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    pub kind: OperationKind,
    pub key: CorrelationKey,
    pub id: RequestId,
}

/// A caller's side of a pending request
#[derive(Debug)]
pub struct PendingHandle {
    ticket: RequestTicket,
    rx: oneshot::Receiver<Settlement>,
}

impl PendingHandle {
    pub fn ticket(&self) -> &RequestTicket {
        &self.ticket
    }

    /// Wait for the request to settle.
    ///
    /// Returns `None` if the entry went away without delivering anything
    /// (registry torn down, or a lapsed reservation was replaced).
    pub async fn settled(&mut self) -> Option<Settlement> {
        (&mut self.rx).await.ok()
    }

    /// Non-blocking check, used by tests and diagnostics
    pub fn try_settled(&mut self) -> Option<Settlement> {
        self.rx.try_recv().ok()
    }
}

/// Result of [`PendingRequestRegistry::acquire_or_join`]
#[derive(Debug)]
pub enum Acquisition {
    /// Fresh request; the caller must issue the platform call
    New(PendingHandle),
    /// Identical request already in flight; only await it
    Joined(PendingHandle),
    /// Key occupied by different arguments or by a timed-out call; await
    /// it, then retry
    Busy(PendingHandle),
}

impl Acquisition {
    pub fn is_new(&self) -> bool {
        matches!(self, Acquisition::New(_))
    }

    pub fn into_handle(self) -> PendingHandle {
        match self {
            Acquisition::New(h) | Acquisition::Joined(h) | Acquisition::Busy(h) => h,
        }
    }
}

/// Result of settling by key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyedMatch {
    Settled,
    /// Swallowed by the reservation of a request that already timed out
    LateAfterTimeout,
    NoRequest,
}

/// Result of positional (un-keyed) matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionalMatch {
    Settled(CorrelationKey),
    LateAfterTimeout(CorrelationKey),
    NoCandidate,
    Ambiguous(usize),
}

#[derive(Default)]
pub struct PendingRequestRegistry {
    entries: Mutex<HashMap<Slot, PendingRequest>>,
    next_id: AtomicU64,
}

impl PendingRequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request for `(kind, key)` or join the one already in flight.
    ///
    /// The entry is visible to the router as soon as this returns, so the
    /// platform call can be issued afterwards without losing a fast callback.
    pub fn acquire_or_join(
        &self,
        kind: OperationKind,
        key: &CorrelationKey,
        fingerprint: Option<&str>,
    ) -> Result<Acquisition> {
        let mut entries = self.entries.lock()?;
        let slot = Slot::new(kind, key.wire());
        let (tx, rx) = oneshot::channel();

        if entries.get(&slot).is_some_and(|r| r.has_lapsed(Instant::now())) {
            entries.remove(&slot);
            debug!(%key, operation = %kind, "reservation of timed-out request lapsed");
        }

        if let Some(existing) = entries.get_mut(&slot) {
            existing.waiters.push(tx);
            let ticket = RequestTicket {
                kind,
                key: existing.key.clone(),
                id: existing.id,
            };
            let handle = PendingHandle { ticket, rx };
            return if existing.is_reserved() {
                debug!(request = %existing.id, %key, "key reserved by timed-out request");
                Ok(Acquisition::Busy(handle))
            } else if existing.fingerprint.as_deref() == fingerprint {
                debug!(request = %existing.id, %key, "joined in-flight request");
                Ok(Acquisition::Joined(handle))
            } else {
                debug!(request = %existing.id, %key, "key busy with different arguments");
                Ok(Acquisition::Busy(handle))
            };
        }

        let id = RequestId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        entries.insert(
            slot,
            PendingRequest {
                id,
                key: key.clone(),
                fingerprint: fingerprint.map(str::to_string),
                waiters: vec![tx],
                registered_at: Instant::now(),
                reserved_until: None,
            },
        );
        debug!(request = %id, %key, operation = %kind, "registered pending request");

        Ok(Acquisition::New(PendingHandle {
            ticket: RequestTicket {
                kind,
                key: key.clone(),
                id,
            },
            rx,
        }))
    }

    /// Settle the request whose key renders to `wire`
    pub fn settle(
        &self,
        kind: OperationKind,
        wire: &str,
        settlement: Settlement,
    ) -> Result<KeyedMatch> {
        let removed = self.entries.lock()?.remove(&Slot::new(kind, wire));
        Ok(match removed {
            Some(request) => {
                let reserved = request.is_reserved();
                // Waiters on a reservation are retrying callers; they discard it
                request.settle(settlement);
                if reserved {
                    KeyedMatch::LateAfterTimeout
                } else {
                    KeyedMatch::Settled
                }
            }
            None => KeyedMatch::NoRequest,
        })
    }

    /// Settle the only outstanding request of `kind`, if there is exactly one.
    /// Reservations count as outstanding: the payload may be their late answer.
    pub fn settle_positional(
        &self,
        kind: OperationKind,
        settlement: Settlement,
    ) -> Result<PositionalMatch> {
        let mut entries = self.entries.lock()?;
        let mut candidates = entries.keys().filter(|s| s.kind == kind).cloned();
        let first = candidates.next();
        let others = candidates.count();

        match (first, others) {
            (None, _) => Ok(PositionalMatch::NoCandidate),
            (Some(slot), 0) => match entries.remove(&slot) {
                Some(request) => {
                    drop(entries);
                    let key = request.key.clone();
                    let reserved = request.is_reserved();
                    request.settle(settlement);
                    if reserved {
                        Ok(PositionalMatch::LateAfterTimeout(key))
                    } else {
                        Ok(PositionalMatch::Settled(key))
                    }
                }
                None => Ok(PositionalMatch::NoCandidate),
            },
            (Some(_), others) => Ok(PositionalMatch::Ambiguous(others + 1)),
        }
    }

    /// Settle a specific request, only if it is still the one registered under
    /// its key. Used when the host refuses the call, so it can never touch a
    /// newer request that reuses the key.
    pub fn settle_request(&self, ticket: &RequestTicket, settlement: Settlement) -> Result<bool> {
        let mut entries = self.entries.lock()?;
        let slot = Slot::new(ticket.kind, ticket.key.wire());
        if !entries.get(&slot).is_some_and(|r| r.id == ticket.id) {
            return Ok(false);
        }
        match entries.remove(&slot) {
            Some(request) => {
                drop(entries);
                request.settle(settlement);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Reject every caller of a specific request with `Rejection::TimedOut`
    /// and keep its key reserved for `hold`, since the host call is still in
    /// flight. Returns `false` if the request already settled or timed out.
    pub fn expire_request(
        &self,
        ticket: &RequestTicket,
        timeout: Duration,
        hold: Duration,
    ) -> Result<bool> {
        let mut entries = self.entries.lock()?;
        let slot = Slot::new(ticket.kind, ticket.key.wire());
        let Some(request) = entries
            .get_mut(&slot)
            .filter(|r| r.id == ticket.id && !r.is_reserved())
        else {
            return Ok(false);
        };

        request.reserved_until = Some(Instant::now() + hold);
        let waiters = std::mem::take(&mut request.waiters);
        debug!(
            request = %request.id,
            key = %request.key,
            waiters = waiters.len(),
            "pending request timed out"
        );
        drop(entries);

        for waiter in waiters {
            let _ = waiter.send(Err(Rejection::TimedOut(timeout)));
        }
        Ok(true)
    }

    /// Requests some caller can still receive; timed-out reservations excluded
    pub fn pending_count(&self) -> Result<usize> {
        Ok(self.entries.lock()?.values().filter(|r| !r.is_reserved()).count())
    }

    pub fn pending_of(&self, kind: OperationKind) -> Result<usize> {
        Ok(self
            .entries
            .lock()?
            .iter()
            .filter(|(slot, r)| slot.kind == kind && !r.is_reserved())
            .count())
    }
}

#[cfg(test)]
impl PendingRequestRegistry {
    fn resolve(&self, kind: OperationKind, wire: &str, value: Option<String>) -> Result<bool> {
        Ok(self.settle(kind, wire, Ok(value))? == KeyedMatch::Settled)
    }

    fn reject(&self, kind: OperationKind, wire: &str, rejection: Rejection) -> Result<bool> {
        Ok(self.settle(kind, wire, Err(rejection))? == KeyedMatch::Settled)
    }

    fn is_pending(&self, kind: OperationKind, key: &CorrelationKey) -> Result<bool> {
        Ok(self
            .entries
            .lock()?
            .get(&Slot::new(kind, key.wire()))
            .is_some_and(|r| !r.is_reserved()))
    }
}
