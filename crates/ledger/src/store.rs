//! Storage seam for the inventory ledger.
//!
//! The ledger never touches a database handle directly; it talks to a
//! [`TicketStore`]. Implementations live in `eventick-infra`
//! (`InMemoryTicketStore` for tests/dev, `PostgresTicketStore` for
//! production).

use async_trait::async_trait;
use thiserror::Error;

use eventick_core::EventId;

use crate::model::{Event, LedgerStats, Registration};

/// Ticket store operation error.
///
/// These are infrastructure failures only. "Event missing" and
/// "insufficient capacity" are *outcomes* of a reservation attempt, not
/// errors — see [`ReserveOutcome`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The durable store could not be reached or the operation did not
    /// complete. Nothing was written.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The conditional write lost a race (e.g. a serialization failure)
    /// and was rolled back. Safe to retry.
    #[error("conditional write lost a race: {0}")]
    Conflict(String),
}

/// Outcome of an atomic reserve attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// Counter decremented and registration row inserted, in one unit.
    Committed {
        /// Remaining count immediately after the decrement.
        tickets_remaining: u32,
    },
    /// The conditional decrement did not take effect: not enough tickets.
    /// State is unchanged.
    Insufficient {
        /// Remaining count at the time of decision.
        tickets_remaining: u32,
    },
    /// The event row does not exist. State is unchanged.
    EventMissing,
}

/// Durable table of events and registrations.
///
/// Implementations must make `commit_registration` atomic: the conditional
/// decrement of `tickets_remaining` and the insertion of the registration
/// row either both happen or neither does, and two attempts racing on the
/// same event must be totally ordered (no interleaving may observe a stale
/// count). Operations on different events must not contend with each other.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Insert a freshly created event row.
    async fn insert_event(&self, event: &Event) -> Result<(), StoreError>;

    /// Point-in-time read of a single event.
    async fn fetch_event(&self, id: EventId) -> Result<Option<Event>, StoreError>;

    /// All events, ordered by scheduled date.
    async fn list_events(&self) -> Result<Vec<Event>, StoreError>;

    /// Delete an event and cascade to its registrations.
    ///
    /// Returns `false` if no such event existed.
    async fn delete_event(&self, id: EventId) -> Result<bool, StoreError>;

    /// Atomically decrement the event's `tickets_remaining` by
    /// `registration.ticket_count` iff enough tickets remain, and insert
    /// the registration row in the same unit.
    async fn commit_registration(
        &self,
        registration: &Registration,
    ) -> Result<ReserveOutcome, StoreError>;

    /// Aggregate counters: total events and total tickets booked.
    async fn stats(&self) -> Result<LedgerStats, StoreError>;
}

#[async_trait]
impl<S> TicketStore for std::sync::Arc<S>
where
    S: TicketStore + ?Sized,
{
    async fn insert_event(&self, event: &Event) -> Result<(), StoreError> {
        (**self).insert_event(event).await
    }

    async fn fetch_event(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        (**self).fetch_event(id).await
    }

    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        (**self).list_events().await
    }

    async fn delete_event(&self, id: EventId) -> Result<bool, StoreError> {
        (**self).delete_event(id).await
    }

    async fn commit_registration(
        &self,
        registration: &Registration,
    ) -> Result<ReserveOutcome, StoreError> {
        (**self).commit_registration(registration).await
    }

    async fn stats(&self) -> Result<LedgerStats, StoreError> {
        (**self).stats().await
    }
}
