//! In-process presence registry.
//!
//! Maps a user's public id to the set of live WebSocket connections that
//! user currently holds. One user may be connected from several devices;
//! the user counts as online while at least one handle remains. The
//! registry is the single shared mutable structure in the process and is
//! guarded by one async mutex held only for map mutation and snapshots.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::dispatch::ServerEvent;

/// One live WebSocket connection. The id doubles as the fan-out
/// correlation id clients echo back on mutating requests.
#[derive(Clone)]
pub struct ConnectionHandle {
    id: String,
    tx: mpsc::Sender<ServerEvent>,
}

impl ConnectionHandle {
    pub fn new(id: impl Into<String>, tx: mpsc::Sender<ServerEvent>) -> Self {
        Self { id: id.into(), tx }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Best-effort push. A full or closed channel is the connection's
    /// problem, never the caller's; the failure is logged and swallowed.
    pub fn push(&self, event: ServerEvent) {
        if let Err(err) = self.tx.try_send(event) {
            debug!(connection_id = %self.id, error = %err, "dropping event for connection");
        }
    }
}

#[derive(Clone, Default)]
pub struct PresenceRegistry {
    inner: Arc<Mutex<HashMap<String, Vec<ConnectionHandle>>>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a connection to a user. Registering a handle id that is
    /// already present for that user is a no-op apart from the presence
    /// broadcast, so a reconnect race cannot double-register a device.
    pub async fn register(&self, user_public_id: &str, handle: ConnectionHandle) {
        let recipients;
        let online;
        {
            let mut map = self.inner.lock().await;
            let handles = map.entry(user_public_id.to_string()).or_default();
            if !handles.iter().any(|existing| existing.id == handle.id) {
                handles.push(handle);
            }
            online = Self::online_snapshot(&map);
            recipients = Self::handle_snapshot(&map);
        }
        debug!(user = %user_public_id, online = online.len(), "connection registered");
        Self::broadcast_presence(&recipients, online);
    }

    /// Detach a connection by handle id, wherever it lives. Unknown ids
    /// are a no-op and trigger no broadcast.
    pub async fn unregister(&self, handle_id: &str) {
        let recipients;
        let online;
        {
            let mut map = self.inner.lock().await;
            let mut removed = false;
            map.retain(|_, handles| {
                let before = handles.len();
                handles.retain(|handle| handle.id != handle_id);
                removed |= handles.len() != before;
                !handles.is_empty()
            });
            if !removed {
                return;
            }
            online = Self::online_snapshot(&map);
            recipients = Self::handle_snapshot(&map);
        }
        debug!(connection_id = %handle_id, online = online.len(), "connection unregistered");
        Self::broadcast_presence(&recipients, online);
    }

    /// Every live handle of a user; empty for unknown or offline users.
    pub async fn handles_for(&self, user_public_id: &str) -> Vec<ConnectionHandle> {
        let map = self.inner.lock().await;
        map.get(user_public_id).cloned().unwrap_or_default()
    }

    /// Snapshot of all currently-online user public ids.
    pub async fn online_user_ids(&self) -> Vec<String> {
        let map = self.inner.lock().await;
        Self::online_snapshot(&map)
    }

    fn online_snapshot(map: &HashMap<String, Vec<ConnectionHandle>>) -> Vec<String> {
        let mut ids: Vec<String> = map.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn handle_snapshot(map: &HashMap<String, Vec<ConnectionHandle>>) -> Vec<ConnectionHandle> {
        map.values().flatten().cloned().collect()
    }

    fn broadcast_presence(recipients: &[ConnectionHandle], online_user_ids: Vec<String>) {
        let event = ServerEvent::PresenceUpdated { online_user_ids };
        for handle in recipients {
            handle.push(event.clone());
        }
    }
}
