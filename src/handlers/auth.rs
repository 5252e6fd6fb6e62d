// src/handlers/auth.rs

use std::sync::Arc;

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{LoginRequest, MeResponse, Role},
    store::Store,
    utils::{
        hash::verify_password,
        jwt::{Claims, sign_jwt},
    },
};

/// Authenticates a user and returns a JWT token.
///
/// Verifies the email and password, then resolves the profile role. A role
/// other than `admin` or `alumno` blocks the login with 403. The response
/// tells the client which route to land on.
pub async fn login(
    State(store): State<Arc<dyn Store>>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = store
        .find_user_by_email(&payload.email)
        .await?
        .ok_or(AppError::AuthError("Invalid email or password".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid email or password".to_string()));
    }

    let role: Role = user.role.parse().map_err(|e: String| {
        tracing::warn!("Login blocked for {}: {}", user.email, e);
        AppError::Forbidden("Unrecognized role".to_string())
    })?;

    let token = sign_jwt(user.id, &user.email, role, &config.jwt_secret, config.jwt_expiration)?;

    tracing::info!("User {} signed in as {}", user.email, role);

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "role": role,
        "redirect": role.home_route(),
    })))
}

/// Returns the session context carried by the token.
pub async fn me(Extension(claims): Extension<Claims>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(MeResponse {
        id: claims.user_id()?,
        home: claims.role.home_route(),
        email: claims.email,
        role: claims.role,
    }))
}
