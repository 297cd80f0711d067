use crate::core::config::AppState;
use crate::core::ctx::Ctx;
use crate::core::error::{Error, Result};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

pub async fn mw_require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    debug!("MIDDLEWARE: require_auth");

    let token = bearer_token(req.headers())?;

    let user_id = state.tokens.verify(token).map_err(|e| {
        debug!("[Auth] Rejected token: {}", e);
        Error::AuthFailInvalidToken
    })?;

    req.extensions_mut().insert(Ctx::new(user_id));

    Ok(next.run(req).await)
}

/// Attach a `Ctx` when a valid bearer token is present; never rejects.
pub async fn mw_resolve_ctx(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let user_id = bearer_token(req.headers())
        .ok()
        .and_then(|token| state.tokens.verify(token).ok());

    if let Some(user_id) = user_id {
        req.extensions_mut().insert(Ctx::new(user_id));
    }

    next.run(req).await
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let auth_header = match headers.get(header::AUTHORIZATION) {
        Some(h) => h.to_str().map_err(|_| Error::AuthFailTokenWrongFormat)?,
        None => return Err(Error::AuthFailNoToken),
    };

    match auth_header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(Error::AuthFailTokenWrongFormat),
    }
}
