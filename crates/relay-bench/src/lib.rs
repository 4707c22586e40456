//! Shared fixtures for the relay benchmarks.

use relay_protocol::OutboundEvent;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tenvis_relay_core::{DeliveryError, EventSink, Fanout, Router};

/// Sink that only counts deliveries.
#[derive(Debug, Default)]
pub struct CountingSink {
    delivered: AtomicUsize,
    connections: AtomicUsize,
}

impl CountingSink {
    /// Number of events handed out so far.
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::Relaxed)
    }
}

impl EventSink for CountingSink {
    fn send(&self, _connection_id: &str, _event: Arc<OutboundEvent>) -> Result<(), DeliveryError> {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn broadcast(&self, _event: Arc<OutboundEvent>) -> Fanout {
        let connections = self.connections.load(Ordering::Relaxed);
        self.delivered.fetch_add(connections, Ordering::Relaxed);
        Fanout {
            delivered: connections,
            ..Fanout::default()
        }
    }
}

/// Router with `users` online users, each holding `devices` connections.
///
/// Users are named `user-<n>` and connections `conn-<n>-<d>`.
#[must_use]
pub fn populated_router(users: usize, devices: usize) -> Router<CountingSink> {
    let sink = CountingSink::default();
    sink.connections.store(users * devices, Ordering::Relaxed);

    let router = Router::new(sink);
    for user in 0..users {
        for device in 0..devices {
            router.register_presence(&format!("conn-{user}-{device}"), &format!("user-{user}"));
        }
    }
    router
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_populated_router() {
        let router = populated_router(10, 3);
        let stats = router.stats();
        assert_eq!(stats.user_count, 10);
        assert_eq!(stats.connection_count, 30);
        assert_eq!(router.lookup("user-4").unwrap().socket_ids.len(), 3);
    }
}
