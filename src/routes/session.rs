use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{
    dao::models::AccountId, error::AppError, services::account_service, state::SharedState,
};

/// Header carrying the account identifier issued by the auth provider.
pub const ACCOUNT_HEADER: &str = "x-account-id";

/// Resolve the caller's session, creating their game on first use, and attach
/// it to the request extensions.
pub async fn require_session(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let account = req
        .headers()
        .get(ACCOUNT_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(AccountId::new)
        .ok_or_else(|| AppError::Unauthorized("missing account header `X-Account-Id`".into()))?;

    let session = account_service::ensure_root(&state, account).await?;
    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}
