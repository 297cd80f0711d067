//! Finance Handlers and Router
//!
//! Route-level auth follows the legacy matrix: only `add-expense` and the
//! chatbot always need a token. With `require_auth_on_writes` every
//! mutating record route is protected as well; otherwise a token on those
//! routes is optional and only used to record the owner.

use crate::core::auth::middleware::{mw_require_auth, mw_resolve_ctx};
use crate::core::AppState;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

pub mod chatbot;
pub mod records;

pub fn router(state: AppState) -> Router<AppState> {
    let require_auth = middleware::from_fn_with_state(state.clone(), mw_require_auth);

    let protected = Router::new()
        .route("/add-expense", post(records::add_expense))
        .route("/financial-chatbot/chat", post(chatbot::chat))
        .route_layer(require_auth.clone());

    let writes = Router::new()
        .route("/add-income", post(records::add_income))
        .route("/delete-income/{id}", delete(records::delete_income))
        .route("/delete-expense/{id}", delete(records::delete_expense))
        .route("/add-transaction", post(records::add_transaction))
        .route("/delete-transaction/{id}", delete(records::delete_transaction))
        .route("/update-transaction/{id}", put(records::update_transaction));

    let writes = if state.config.require_auth_on_writes {
        writes.route_layer(require_auth)
    } else {
        writes.route_layer(middleware::from_fn_with_state(state.clone(), mw_resolve_ctx))
    };

    let reads = Router::new()
        .route("/get-incomes", get(records::get_incomes))
        .route("/get-expenses", get(records::get_expenses))
        .route("/get-transactions", get(records::get_transactions));

    Router::new().merge(protected).merge(writes).merge(reads)
}
