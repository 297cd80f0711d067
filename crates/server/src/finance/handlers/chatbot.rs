//! Financial chatbot handler

use crate::core::ctx::Ctx;
use crate::core::error::{Error, Result};
use crate::core::payload::Payload;
use crate::core::AppState;
use crate::finance::advisor::UserContext;
use crate::finance::store::RecordFilter;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct ChatbotRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatbotResponse {
    pub response: String,
}

/// POST /financial-chatbot/chat
pub async fn chat(
    State(state): State<AppState>,
    ctx: Ctx,
    Payload(req): Payload<ChatbotRequest>,
) -> Result<Json<ChatbotResponse>> {
    info!("POST /financial-chatbot/chat - {}", ctx.user_id());

    if req.message.trim().is_empty() {
        return Err(Error::Validation("Message is required".to_string()));
    }

    let advisor = state
        .advisor
        .as_ref()
        .ok_or_else(|| Error::UpstreamUnavailable("advisor not configured".to_string()))?;

    let expenses = state
        .records
        .expenses
        .list(&RecordFilter::owned_by(ctx.user_id()))
        .await;
    let context = UserContext::from_expenses(&expenses);

    let response = advisor.get_advice(&context, &req.message).await?;

    Ok(Json(ChatbotResponse { response }))
}
