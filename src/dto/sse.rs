use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::dao::{changes::ChangeEvent, models::RecordId};

#[derive(Clone, Debug)]
/// Dispatched payload carried across the SSE channel.
pub struct ServerEvent {
    /// SSE event name.
    pub event: Option<String>,
    /// Serialized payload.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }

    /// Wrap an accepted change as a `change` event.
    pub fn change(event: &ChangeEvent) -> serde_json::Result<Self> {
        Self::json(Some("change".to_string()), event)
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Game whose changes are streamed.
    pub game: RecordId,
    /// Single record the stream is narrowed to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<RecordId>,
    /// Whether the backend is running without a sync store.
    pub degraded: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
/// Query string accepted by the change feed.
pub struct WatchQuery {
    /// Only stream changes of this record.
    pub record: Option<RecordId>,
}
