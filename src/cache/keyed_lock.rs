//! Per-key mutual exclusion with lease-counted tickets.
//!
//! [`KeyedLock`] serializes expensive work per key (a template path, in this
//! crate) while letting unrelated keys proceed concurrently. Each key in use
//! owns one ticket: a per-key mutex plus a lease count. Tickets are created on
//! first request and discarded when the last lease is returned, so idle keys
//! leave no state behind.
//!
//! # Locking Protocol
//!
//! Two levels of locking are involved:
//!
//! 1. **Membership lock**: a single short-held mutex guarding the ticket map.
//!    It is held only while looking up/creating a ticket and adjusting its
//!    lease count, never while the caller's work runs.
//! 2. **Ticket lock**: the per-key mutex held for the caller's whole critical
//!    section.
//!
//! On release the lease count is decremented under the membership lock. When it
//! reaches zero the ticket is removed from the map *before* its mutex is
//! unlocked. A caller arriving later therefore either attaches to a ticket that
//! still has a pending holder, or creates a fresh one; it can never attach to a
//! ticket that is about to be discarded.
//!
//! ```text
//! acquire("a")   membership { ticket(a).leases += 1 }   lock ticket(a)
//! release("a")   membership { leases -= 1; if 0 { remove(a) }; unlock ticket(a) }
//! ```

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

type TicketGate = Arc<Mutex<()>>;
type HeldGate = ArcMutexGuard<RawMutex, ()>;

/// Ticket state stored in the membership map.
#[derive(Debug)]
struct Ticket {
    gate: TicketGate,
    /// Callers holding or waiting for `gate`
    leases: usize,
}

/// A guard for an acquired key.
///
/// The key stays locked until the guard is dropped. Dropping always runs,
/// including during unwinding, so the lease is returned on every exit path.
#[must_use = "the key is released as soon as the guard is dropped"]
pub struct KeyedLockGuard<'a> {
    owner: &'a KeyedLock,
    key: String,
    held: Option<HeldGate>,
}

impl KeyedLockGuard<'_> {
    /// The key this guard holds.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Debug for KeyedLockGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedLockGuard").field("key", &self.key).finish_non_exhaustive()
    }
}

impl Drop for KeyedLockGuard<'_> {
    fn drop(&mut self) {
        if let Some(held) = self.held.take() {
            self.owner.release(&self.key, held);
        }
    }
}

/// Keyed mutual exclusion.
///
/// # Examples
///
/// ```rust
/// use viewbind::cache::KeyedLock;
///
/// let locks = KeyedLock::new();
/// {
///     let _guard = locks.acquire("/views/news.tera");
///     assert_eq!(locks.lease_count("/views/news.tera"), 1);
///     // compile the template...
/// }
/// // the ticket is gone once its last holder leaves
/// assert!(locks.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct KeyedLock {
    tickets: Mutex<HashMap<String, Ticket>>,
}

impl KeyedLock {
    /// Create an empty keyed lock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire `key`, blocking until every earlier holder of the same key has
    /// released it. Different keys never block each other.
    pub fn acquire(&self, key: &str) -> KeyedLockGuard<'_> {
        let gate = self.withdraw(key);
        let held = gate.lock_arc();
        trace!(key, "Acquired keyed lock");

        KeyedLockGuard {
            owner: self,
            key: key.to_string(),
            held: Some(held),
        }
    }

    /// Acquire `key`, giving up after `timeout`.
    ///
    /// Returns `None` on timeout. The lease taken while waiting is returned, so
    /// a timed-out caller leaves no ticket behind.
    pub fn acquire_timeout(&self, key: &str, timeout: Duration) -> Option<KeyedLockGuard<'_>> {
        let gate = self.withdraw(key);
        match gate.try_lock_arc_for(timeout) {
            Some(held) => Some(KeyedLockGuard {
                owner: self,
                key: key.to_string(),
                held: Some(held),
            }),
            None => {
                let mut tickets = self.tickets.lock();
                Self::return_lease(&mut tickets, key, &gate);
                trace!(key, ?timeout, "Timed out waiting for keyed lock");
                None
            }
        }
    }

    /// Number of callers holding or waiting for `key`.
    pub fn lease_count(&self, key: &str) -> usize {
        self.tickets.lock().get(key).map_or(0, |ticket| ticket.leases)
    }

    /// Number of keys with a live ticket.
    pub fn len(&self) -> usize {
        self.tickets.lock().len()
    }

    /// Whether no key currently has a live ticket.
    pub fn is_empty(&self) -> bool {
        self.tickets.lock().is_empty()
    }

    /// Attach to the ticket for `key`, creating it if needed.
    fn withdraw(&self, key: &str) -> TicketGate {
        let mut tickets = self.tickets.lock();
        let ticket = tickets.entry(key.to_string()).or_insert_with(|| Ticket {
            gate: Arc::new(Mutex::new(())),
            leases: 0,
        });
        ticket.leases += 1;
        Arc::clone(&ticket.gate)
    }

    /// Return the lease held by a guard and unlock its ticket.
    ///
    /// The ticket leaves the map before its mutex is unlocked; both happen under
    /// the membership lock.
    fn release(&self, key: &str, held: HeldGate) {
        let mut tickets = self.tickets.lock();
        Self::return_lease(&mut tickets, key, ArcMutexGuard::mutex(&held));
        drop(held);
        trace!(key, "Released keyed lock");
    }

    fn return_lease(tickets: &mut HashMap<String, Ticket>, key: &str, gate: &TicketGate) {
        let Some(ticket) = tickets.get_mut(key) else {
            return;
        };
        debug_assert!(Arc::ptr_eq(&ticket.gate, gate), "ticket replaced while leased");

        ticket.leases -= 1;
        if ticket.leases == 0 {
            tickets.remove(key);
        }
    }
}
