use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};

use eventick_core::EventId;
use eventick_ledger::NewEvent;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub async fn list_events(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.ledger.list_events().await {
        Ok(events) => Json(events).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn create_event(
    Extension(services): Extension<Arc<AppServices>>,
    principal: Option<Extension<PrincipalContext>>,
    Json(body): Json<dto::CreateEventRequest>,
) -> axum::response::Response {
    if let Err(resp) = errors::require_admin(principal.as_deref()) {
        return resp;
    }

    let Ok(total_capacity) = u32::try_from(body.total_tickets) else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_capacity",
            format!("total_tickets must be a non-negative integer, got {}", body.total_tickets),
        );
    };

    let new = NewEvent {
        title: body.title,
        description: body.description,
        date: body.date,
        total_capacity,
    };

    match services.ledger.create_event(new).await {
        Ok(event) => (StatusCode::CREATED, Json(event)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn delete_event(
    Extension(services): Extension<Arc<AppServices>>,
    principal: Option<Extension<PrincipalContext>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = errors::require_admin(principal.as_deref()) {
        return resp;
    }

    let event_id = match parse_event_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger.delete_event(event_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn get_availability(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let event_id = match parse_event_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger.get_availability(event_id).await {
        Ok(tickets_remaining) => Json(serde_json::json!({
            "event_id": event_id.to_string(),
            "tickets_remaining": tickets_remaining,
        }))
        .into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub(crate) fn parse_event_id(s: &str) -> Result<EventId, axum::response::Response> {
    s.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid event id")
    })
}
