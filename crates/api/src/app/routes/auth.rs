use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use eventick_auth::{DirectoryError, Role, UserRecord, hash_password, verify_password};
use eventick_core::UserId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Log in as a user, auto-registering unknown emails.
///
/// First login with a fresh email creates the account with the supplied
/// password; subsequent logins must present the same password.
pub async fn user_login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    let email = body.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "a valid email is required",
        );
    }
    if body.password.is_empty() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "password cannot be empty",
        );
    }

    let existing = match services.users.find_by_email(&email).await {
        Ok(v) => v,
        Err(e) => return errors::directory_error_to_response(e),
    };

    let user = match existing {
        Some(user) => user,
        None => {
            let user = UserRecord {
                id: UserId::new(),
                email: email.clone(),
                password_digest: hash_password(&body.password),
                created_at: Utc::now(),
            };
            match services.users.insert_user(&user).await {
                Ok(()) => {
                    tracing::info!(user_id = %user.id, "auto-registered user");
                    user
                }
                Err(DirectoryError::DuplicateEmail(_)) => {
                    // Lost an auto-registration race; the other request's
                    // record wins and this password is checked against it.
                    match services.users.find_by_email(&email).await {
                        Ok(Some(user)) => user,
                        Ok(None) => {
                            return errors::json_error(
                                StatusCode::SERVICE_UNAVAILABLE,
                                "storage_unavailable",
                                "user directory inconsistent",
                            );
                        }
                        Err(e) => return errors::directory_error_to_response(e),
                    }
                }
                Err(e) => return errors::directory_error_to_response(e),
            }
        }
    };

    if !verify_password(&body.password, &user.password_digest) {
        return errors::json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid email or password",
        );
    }

    token_response(&services, user.id, &user.email, Role::User)
}

/// Log in as the configured administrator.
pub async fn admin_login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    let email = body.email.trim().to_lowercase();
    if email != services.admin_email
        || !verify_password(&body.password, &services.admin_password_digest)
    {
        return errors::json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid email or password",
        );
    }

    token_response(&services, UserId::new(), &email, Role::Admin)
}

fn token_response(
    services: &AppServices,
    user_id: UserId,
    email: &str,
    role: Role,
) -> axum::response::Response {
    match services.issue_token(user_id, email, role) {
        Ok(token) => Json(serde_json::json!({
            "token": token,
            "email": email,
            "role": role.to_string(),
        }))
        .into_response(),
        Err(e) => errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "token_error",
            e.to_string(),
        ),
    }
}
