//! `eventick-ledger` — the inventory ledger.
//!
//! This crate owns the authoritative ticket-availability counter per event
//! and arbitrates concurrent registration attempts: availability never goes
//! negative, and every accepted registration is durably reflected in the
//! count exactly once. Storage is reached through the [`TicketStore`] seam;
//! implementations live in `eventick-infra`.

pub mod ledger;
pub mod model;
pub mod store;

pub use ledger::{Ledger, LedgerError, NewEvent, RetryPolicy};
pub use model::{Event, LedgerStats, Purchaser, Registration, Reservation};
pub use store::{ReserveOutcome, StoreError, TicketStore};
