//! Outbound delivery.
//!
//! The router never talks to sockets directly. It hands events to an
//! [`EventSink`], which delivers to one named connection or to every
//! connection. Delivery is fire-and-forget: nothing is awaited or retried.

use relay_protocol::{ConnectionId, OutboundEvent};
use std::ops::AddAssign;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Delivery errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// No such connection is attached to the sink.
    #[error("Unknown connection: {0}")]
    UnknownConnection(ConnectionId),

    /// The connection's outbound queue is gone.
    #[error("Connection closed: {0}")]
    Closed(ConnectionId),
}

/// Result of fanning one event out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fanout {
    /// Connections the event was handed to.
    pub delivered: usize,
    /// Connections whose delivery failed.
    pub failed: usize,
    /// Resolved users that had no live connection.
    pub absent: usize,
}

impl Fanout {
    /// A single resolved user was offline.
    #[must_use]
    pub fn absent() -> Self {
        Self {
            absent: 1,
            ..Self::default()
        }
    }

    /// Whether nothing was handed to any connection.
    #[must_use]
    pub fn is_dropped(&self) -> bool {
        self.delivered == 0 && self.failed == 0
    }
}

impl AddAssign for Fanout {
    fn add_assign(&mut self, rhs: Self) {
        self.delivered += rhs.delivered;
        self.failed += rhs.failed;
        self.absent += rhs.absent;
    }
}

/// Destination for outbound events.
pub trait EventSink: Send + Sync {
    /// Deliver an event to one connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is unknown or closed.
    fn send(&self, connection_id: &str, event: Arc<OutboundEvent>) -> Result<(), DeliveryError>;

    /// Deliver an event to every connection.
    fn broadcast(&self, event: Arc<OutboundEvent>) -> Fanout;

    /// Deliver an event to each listed connection.
    ///
    /// A failed connection is logged and skipped; the rest still receive
    /// the event.
    fn send_all(&self, connection_ids: &[ConnectionId], event: Arc<OutboundEvent>) -> Fanout {
        let mut fanout = Fanout::default();
        for connection_id in connection_ids {
            match self.send(connection_id, Arc::clone(&event)) {
                Ok(()) => fanout.delivered += 1,
                Err(e) => {
                    warn!(connection = %connection_id, event = event.name(), error = %e, "Delivery failed");
                    fanout.failed += 1;
                }
            }
        }
        fanout
    }
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn send(&self, connection_id: &str, event: Arc<OutboundEvent>) -> Result<(), DeliveryError> {
        (**self).send(connection_id, event)
    }

    fn broadcast(&self, event: Arc<OutboundEvent>) -> Fanout {
        (**self).broadcast(event)
    }
}
