use std::convert::Infallible;

use axum::{
    Extension, Router,
    extract::{Query, State},
    middleware,
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{
    dto::sse::WatchQuery,
    error::AppError,
    routes::session::require_session,
    services::sse_service,
    state::{Session, SharedState},
};

#[utoipa::path(
    get,
    path = "/game/events",
    tag = "sse",
    params(
        ("X-Account-Id" = String, Header, description = "Account identifier issued by the auth provider"),
        WatchQuery
    ),
    responses((status = 200, description = "Change feed of the caller's game", content_type = "text/event-stream", body = String))
)]
/// Stream every accepted change to the caller's game, or to a single record.
pub async fn change_stream(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Query(query): Query<WatchQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let (feed, handshake) = sse_service::subscribe_changes(&state, &session, query.record).await?;
    info!(account = %session.account, record = ?query.record, "new change feed connection");
    Ok(sse_service::to_sse_stream(feed, handshake))
}

/// Configure the SSE endpoints.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/game/events", get(change_stream))
        .route_layer(middleware::from_fn_with_state(state, require_session))
}
