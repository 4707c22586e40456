//! In-process connection hub.
//!
//! Each live connection owns an unbounded queue; the hub keeps the sending
//! half so the router can address connections by id. The socket task drains
//! its receiver and writes to the wire.

use crate::sink::{DeliveryError, EventSink, Fanout};
use dashmap::DashMap;
use relay_protocol::{ConnectionId, OutboundEvent};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Receiving half of a connection's outbound queue.
pub type Outbox = mpsc::UnboundedReceiver<Arc<OutboundEvent>>;

/// Counter mixed into connection ids so concurrent connects never collide.
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a unique connection ID.
#[must_use]
pub fn generate_connection_id() -> ConnectionId {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("conn_{:x}_{:x}", timestamp, counter)
}

/// Live connections addressable by id.
#[derive(Debug, Default)]
pub struct ConnectionHub {
    connections: DashMap<ConnectionId, mpsc::UnboundedSender<Arc<OutboundEvent>>>,
}

impl ConnectionHub {
    /// Create an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new connection under a freshly generated id.
    #[must_use]
    pub fn register(&self) -> (ConnectionId, Outbox) {
        let connection_id = generate_connection_id();
        let outbox = self.register_with_id(connection_id.clone());
        (connection_id, outbox)
    }

    /// Attach a connection under a caller-chosen id.
    ///
    /// Replaces any previous queue registered under the same id.
    pub fn register_with_id(&self, connection_id: impl Into<ConnectionId>) -> Outbox {
        let connection_id = connection_id.into();
        let (tx, rx) = mpsc::unbounded_channel();
        if self.connections.insert(connection_id.clone(), tx).is_some() {
            warn!(connection = %connection_id, "Replaced existing connection queue");
        }
        debug!(connection = %connection_id, "Connection attached");
        rx
    }

    /// Detach a connection. Returns `true` if it was attached.
    pub fn unregister(&self, connection_id: &str) -> bool {
        let removed = self.connections.remove(connection_id).is_some();
        if removed {
            debug!(connection = %connection_id, "Connection detached");
        }
        removed
    }

    /// Check if a connection is attached.
    #[must_use]
    pub fn contains(&self, connection_id: &str) -> bool {
        self.connections.contains_key(connection_id)
    }

    /// Number of attached connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Check if no connection is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl EventSink for ConnectionHub {
    fn send(&self, connection_id: &str, event: Arc<OutboundEvent>) -> Result<(), DeliveryError> {
        let tx = self
            .connections
            .get(connection_id)
            .ok_or_else(|| DeliveryError::UnknownConnection(connection_id.to_string()))?;
        tx.send(event)
            .map_err(|_| DeliveryError::Closed(connection_id.to_string()))
    }

    fn broadcast(&self, event: Arc<OutboundEvent>) -> Fanout {
        let mut fanout = Fanout::default();
        for entry in self.connections.iter() {
            if entry.value().send(Arc::clone(&event)).is_ok() {
                fanout.delivered += 1;
            } else {
                warn!(connection = %entry.key(), event = event.name(), "Broadcast delivery failed");
                fanout.failed += 1;
            }
        }
        fanout
    }
}
