//! Fan-out of server events to live WebSocket connections.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::presence::PresenceRegistry;
use crate::routes::models::MessageView;

/// Events the server pushes down a WebSocket connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// First frame on every connection; announces the server-assigned
    /// connection id the client echoes back as its fan-out correlation id.
    #[serde(rename = "hello")]
    Hello {
        connection_id: String,
        user_id: String,
    },
    /// Full snapshot of online user public ids, sent on every connect and
    /// disconnect.
    #[serde(rename = "presence.updated")]
    PresenceUpdated { online_user_ids: Vec<String> },
    #[serde(rename = "message.created")]
    MessageCreated { message: MessageView },
    #[serde(rename = "message.edited")]
    MessageEdited { message: MessageView },
    #[serde(rename = "message.deleted")]
    MessageDeleted {
        message_id: String,
        conversation_id: String,
    },
    #[serde(rename = "error")]
    Error { message: String },
}

/// Pushes one event to every live connection of a set of participants.
///
/// Delivery is fire-and-forget and at most once per connection; ordering is
/// FIFO per connection because each connection drains its own channel.
/// Offline participants simply receive nothing.
#[derive(Clone)]
pub struct Dispatcher {
    registry: PresenceRegistry,
}

impl Dispatcher {
    pub fn new(registry: PresenceRegistry) -> Self {
        Self { registry }
    }

    /// Deliver `event` to all connections of `participant_ids`, skipping the
    /// connection whose id equals `origin_connection_id`. The originating
    /// device already rendered the change optimistically; its user's other
    /// devices still need the echo.
    pub async fn dispatch(
        &self,
        event: &ServerEvent,
        participant_ids: &[&str],
        origin_connection_id: Option<&str>,
    ) {
        for participant in participant_ids {
            let handles = self.registry.handles_for(participant).await;
            for handle in handles {
                if origin_connection_id == Some(handle.id()) {
                    continue;
                }
                handle.push(event.clone());
            }
        }
        debug!(participants = participant_ids.len(), "event dispatched");
    }
}
