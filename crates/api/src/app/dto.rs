use chrono::{DateTime, Utc};
use serde::Deserialize;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: DateTime<Utc>,
    /// Deserialized wide so out-of-range values become a 400 rather than a
    /// serde rejection.
    pub total_tickets: i64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub event_id: String,
    pub name: String,
    pub email: String,
    pub tickets: i64,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}
