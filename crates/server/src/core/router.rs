//! Core Router
//!
//! Account routes. Signup and login are open; everything else needs a
//! bearer token.

use crate::core::auth::handlers as auth_handlers;
use crate::core::auth::middleware::mw_require_auth;
use crate::core::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/verify", get(auth_handlers::verify))
        .route("/profile", get(auth_handlers::profile))
        .route("/change-password", post(auth_handlers::change_password))
        .route_layer(middleware::from_fn_with_state(state, mw_require_auth));

    Router::new()
        .route("/signup", post(auth_handlers::signup))
        .route("/login", post(auth_handlers::login))
        .merge(protected)
}
