use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use eventick_auth::JwtValidator;

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Attach a [`PrincipalContext`] when the request carries a valid bearer
/// token.
///
/// Requests without an `Authorization` header pass through anonymously;
/// most of the surface (listing, availability, registration) is public and
/// per-route guards decide whether a principal is required. A header that is
/// present but unusable is always a 401, never silently anonymous.
pub async fn auth_context(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = match extract_bearer(req.headers()) {
        Ok(None) => return next.run(req).await,
        Ok(Some(token)) => token,
        Err(()) => {
            return json_error(
                StatusCode::UNAUTHORIZED,
                "invalid_authorization_header",
                "expected `Authorization: Bearer <token>`",
            );
        }
    };

    match state.jwt.validate(token, Utc::now()) {
        Ok(claims) => {
            req.extensions_mut().insert(PrincipalContext::new(
                claims.sub,
                claims.email.clone(),
                claims.role,
            ));
            next.run(req).await
        }
        Err(e) => json_error(StatusCode::UNAUTHORIZED, "invalid_token", e.to_string()),
    }
}

fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, ()> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let header = header.to_str().map_err(|_| ())?;
    let token = header.strip_prefix("Bearer ").ok_or(())?.trim();
    if token.is_empty() {
        return Err(());
    }

    Ok(Some(token))
}
