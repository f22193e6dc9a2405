use std::sync::Arc;

use axum::{Json, extract::Extension, response::IntoResponse};

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// Aggregate counters for the admin dashboard.
pub async fn stats(
    Extension(services): Extension<Arc<AppServices>>,
    principal: Option<Extension<PrincipalContext>>,
) -> axum::response::Response {
    if let Err(resp) = errors::require_admin(principal.as_deref()) {
        return resp;
    }

    match services.ledger.stats().await {
        Ok(stats) => Json(serde_json::json!({
            "total_events": stats.total_events,
            "tickets_booked": stats.tickets_booked,
        }))
        .into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
