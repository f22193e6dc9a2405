use axum::{
    Router,
    routing::{delete, get, post},
};

pub mod admin;
pub mod auth;
pub mod events;
pub mod system;
pub mod tickets;

/// Router for everything under `/api`.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/:id", delete(events::delete_event))
        .route("/events/:id/availability", get(events::get_availability))
        .route("/tickets/register", post(tickets::register))
        .route("/auth/user-login", post(auth::user_login))
        .route("/auth/admin-login", post(auth::admin_login))
        .route("/admin/stats", get(admin::stats))
}
