//! `eventick-infra` — storage implementations for the ledger seams.
//!
//! `InMemoryTicketStore` backs tests and local development;
//! `PostgresTicketStore` is the production store. Both uphold the same
//! contract: the reservation check-and-decrement plus the registration
//! insert are one atomic unit, serialized per event.

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryTicketStore, InMemoryUserDirectory};
pub use postgres::{PostgresTicketStore, PostgresUserDirectory};

#[cfg(test)]
mod integration_tests;
