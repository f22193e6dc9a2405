//! `eventick-api` — HTTP surface for the inventory ledger.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
