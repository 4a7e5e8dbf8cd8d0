use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::{
    dao::models::RecordId,
    dto::sse::{Handshake, ServerEvent},
    error::ServiceError,
    services::content_service::{self, ChangeFeed},
    state::{Session, SharedState},
};

/// Subscribe to the session's change feed and prepare the connection handshake.
pub async fn subscribe_changes(
    state: &SharedState,
    session: &Session,
    record: Option<RecordId>,
) -> Result<(ChangeFeed, Handshake), ServiceError> {
    let feed = content_service::watch(state, session, record).await?;
    let handshake = Handshake {
        game: session.game,
        record,
        degraded: state.is_degraded().await,
    };
    Ok((feed, handshake))
}

fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}

/// Convert a change feed into an SSE response, forwarding events until the
/// client disconnects.
pub fn to_sse_stream(
    mut feed: ChangeFeed,
    handshake: Handshake,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if let Ok(payload) = ServerEvent::json(Some("handshake".to_string()), &handshake)
            && tx.send(Ok(to_event(payload))).await.is_err()
        {
            return;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                next = feed.next() => {
                    let Some(change) = next else { break };
                    let payload = match ServerEvent::change(&change) {
                        Ok(payload) => payload,
                        Err(err) => {
                            warn!(record = %change.id, error = %err, "failed to encode change event");
                            continue;
                        }
                    };

                    if tx.send(Ok(to_event(payload))).await.is_err() {
                        break;
                    }
                }
            }
        }

        info!("change feed SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
