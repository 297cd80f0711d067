//! Auth handlers

use crate::core::auth::UserInfo;
use crate::core::config::AppState;
use crate::core::ctx::Ctx;
use crate::core::error::Result;
use crate::core::payload::Payload;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /signup
pub async fn signup(
    State(state): State<AppState>,
    Payload(req): Payload<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    info!("POST /signup - {}", req.email);

    let user = state
        .auth
        .signup(&req.username, &req.email, &req.password)
        .await?;
    let token = state.tokens.issue(&user.id)?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    Payload(req): Payload<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    info!("POST /login - {}", req.email);

    let user = state.auth.login(&req.email, &req.password).await?;
    let token = state.tokens.issue(&user.id)?;

    Ok(Json(AuthResponse { token, user }))
}

/// POST /change-password
pub async fn change_password(
    State(state): State<AppState>,
    ctx: Ctx,
    Payload(req): Payload<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    info!("POST /change-password - {}", ctx.user_id());

    state
        .auth
        .change_password(ctx.user_id(), &req.old_password, &req.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}
