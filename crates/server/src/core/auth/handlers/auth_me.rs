use crate::core::auth::{Profile, UserInfo};
use crate::core::config::AppState;
use crate::core::ctx::Ctx;
use crate::core::error::Result;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub user: UserInfo,
}

/// GET /verify
pub async fn verify(State(state): State<AppState>, ctx: Ctx) -> Result<Json<VerifyResponse>> {
    // The middleware already checked the token; the user may still be gone.
    let user = state.auth.verify_session(ctx.user_id()).await?;

    Ok(Json(VerifyResponse { user }))
}

/// GET /profile
pub async fn profile(State(state): State<AppState>, ctx: Ctx) -> Result<Json<Profile>> {
    Ok(Json(state.auth.get_profile(ctx.user_id()).await?))
}
