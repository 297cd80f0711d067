//! Record handlers
//!
//! Thin wrappers: each route picks its collection and delegates.

use crate::core::auth::handlers::auth::MessageResponse;
use crate::core::ctx::Ctx;
use crate::core::error::Result;
use crate::core::payload::Payload;
use crate::core::AppState;
use crate::finance::records::{FinancialRecord, RecordDraft, RecordKind};
use crate::finance::store::RecordFilter;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

async fn add(
    state: &AppState,
    kind: RecordKind,
    ctx: Option<Ctx>,
    draft: RecordDraft,
) -> Result<(StatusCode, Json<FinancialRecord>)> {
    info!("POST add {}", kind.collection());

    let owner = ctx.map(|c| c.user_id().to_string());
    let record = state.records.get(kind).create(draft, owner).await?;

    Ok((StatusCode::CREATED, Json(record)))
}

async fn list(state: &AppState, kind: RecordKind) -> Json<Vec<FinancialRecord>> {
    Json(state.records.get(kind).list(&RecordFilter::default()).await)
}

async fn remove(state: &AppState, kind: RecordKind, id: &str) -> Result<Json<MessageResponse>> {
    info!("DELETE {} {}", kind.collection(), id);

    state.records.get(kind).delete(id).await?;

    Ok(Json(MessageResponse {
        message: format!("{} deleted", kind.label()),
    }))
}

/// POST /add-income
pub async fn add_income(
    State(state): State<AppState>,
    ctx: Option<Ctx>,
    Payload(draft): Payload<RecordDraft>,
) -> Result<(StatusCode, Json<FinancialRecord>)> {
    add(&state, RecordKind::Income, ctx, draft).await
}

/// GET /get-incomes
pub async fn get_incomes(State(state): State<AppState>) -> Json<Vec<FinancialRecord>> {
    list(&state, RecordKind::Income).await
}

/// DELETE /delete-income/{id}
pub async fn delete_income(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    remove(&state, RecordKind::Income, &id).await
}

/// POST /add-expense
pub async fn add_expense(
    State(state): State<AppState>,
    ctx: Ctx,
    Payload(draft): Payload<RecordDraft>,
) -> Result<(StatusCode, Json<FinancialRecord>)> {
    add(&state, RecordKind::Expense, Some(ctx), draft).await
}

/// GET /get-expenses
pub async fn get_expenses(State(state): State<AppState>) -> Json<Vec<FinancialRecord>> {
    list(&state, RecordKind::Expense).await
}

/// DELETE /delete-expense/{id}
pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    remove(&state, RecordKind::Expense, &id).await
}

/// POST /add-transaction
pub async fn add_transaction(
    State(state): State<AppState>,
    ctx: Option<Ctx>,
    Payload(draft): Payload<RecordDraft>,
) -> Result<(StatusCode, Json<FinancialRecord>)> {
    add(&state, RecordKind::Transaction, ctx, draft).await
}

/// GET /get-transactions
pub async fn get_transactions(State(state): State<AppState>) -> Json<Vec<FinancialRecord>> {
    list(&state, RecordKind::Transaction).await
}

/// DELETE /delete-transaction/{id}
pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    remove(&state, RecordKind::Transaction, &id).await
}

/// PUT /update-transaction/{id}
pub async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload(draft): Payload<RecordDraft>,
) -> Result<Json<FinancialRecord>> {
    info!("PUT /update-transaction/{}", id);

    let record = state.records.transactions.update(&id, draft).await?;

    Ok(Json(record))
}
