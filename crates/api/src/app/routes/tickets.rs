use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};

use eventick_ledger::Purchaser;

use crate::app::routes::events::parse_event_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Register for an event. Public: ticket purchase requires no account.
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterRequest>,
) -> axum::response::Response {
    let event_id = match parse_event_id(&body.event_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let name = body.name.trim();
    let email = body.email.trim();
    if name.is_empty() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "name cannot be empty",
        );
    }
    if email.is_empty() || !email.contains('@') {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "a valid email is required",
        );
    }

    let purchaser = Purchaser {
        name: name.to_string(),
        email: email.to_string(),
    };

    match services.ledger.reserve(event_id, body.tickets, purchaser).await {
        Ok(reservation) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "registration_id": reservation.registration.id.to_string(),
                "event_id": reservation.registration.event_id.to_string(),
                "tickets": reservation.registration.ticket_count,
                "tickets_remaining": reservation.tickets_remaining,
            })),
        )
            .into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
