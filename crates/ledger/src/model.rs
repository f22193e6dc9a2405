//! Typed records owned by the inventory ledger.
//!
//! These replace the untyped key/value maps the endpoints would otherwise
//! pass around: every field is validated at the boundary and carried as a
//! concrete type from there on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eventick_core::{EventId, RegistrationId};

/// A ticketed occasion with a fixed total capacity.
///
/// `tickets_remaining` is the authoritative denormalized counter: it equals
/// `total_capacity` minus the sum of `ticket_count` over all committed
/// registrations for this event, and is reconciled atomically with every
/// registration insert. Only the ledger's store implementations mutate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    /// Scheduled date of the occasion (not the row timestamp).
    pub date: DateTime<Utc>,
    /// Fixed at creation.
    pub total_capacity: u32,
    /// Mutable, 0 ≤ n ≤ `total_capacity`.
    pub tickets_remaining: u32,
    pub created_at: DateTime<Utc>,
}

/// Purchaser contact details. Opaque to the ledger; stored as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchaser {
    pub name: String,
    pub email: String,
}

/// A committed purchase of some number of tickets against one event.
///
/// Created only as the durable side effect of a successful reservation;
/// immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: RegistrationId,
    pub event_id: EventId,
    pub purchaser: Purchaser,
    /// Always > 0.
    pub ticket_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful [`crate::Ledger::reserve`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub registration: Registration,
    /// Remaining count immediately after this reservation committed.
    pub tickets_remaining: u32,
}

/// Aggregate counters for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total_events: u64,
    pub tickets_booked: u64,
}
