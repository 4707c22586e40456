//! Presence tracking for the relay.
//!
//! The registry maps each online user to the set of connections they hold.
//! A user with no live connection has no record at all; there is no
//! "known but offline" state.

use relay_protocol::{ConnectionId, UserId, UserPresence};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::debug;

/// Registry of online users and their connections.
///
/// Two maps are kept in step: the forward map (user to record) and a
/// reverse index (connection to owning user), so removing a connection
/// never scans every user. A connection is owned by at most one user.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    users: HashMap<UserId, UserPresence>,
    owners: HashMap<ConnectionId, UserId>,
}

impl PresenceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a connection to a user.
    ///
    /// Idempotent: re-adding a connection the user already holds is a no-op.
    /// A connection currently owned by a different user is detached from that
    /// user first.
    ///
    /// Returns `true` if the registry changed.
    pub fn add_connection(&mut self, user_id: &str, connection_id: &str) -> bool {
        let previous = self.owners.get(connection_id).cloned();
        if let Some(previous) = previous {
            if previous == user_id {
                return false;
            }
            self.remove_connection(connection_id);
            debug!(
                connection = %connection_id,
                from = %previous,
                to = %user_id,
                "Presence: connection changed owner"
            );
        }

        self.owners
            .insert(connection_id.to_string(), user_id.to_string());

        match self.users.entry(user_id.to_string()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().socket_ids.push(connection_id.to_string());
            }
            Entry::Vacant(entry) => {
                entry.insert(UserPresence::new(user_id, connection_id));
                debug!(user = %user_id, "Presence: user online");
            }
        }

        debug!(user = %user_id, connection = %connection_id, "Presence: connection added");
        true
    }

    /// Detach a connection from whichever user owns it.
    ///
    /// Deletes the user's record when this was their last connection.
    /// Unknown connections are ignored.
    ///
    /// Returns the owning user, if the connection was known.
    pub fn remove_connection(&mut self, connection_id: &str) -> Option<UserId> {
        let user_id = self.owners.remove(connection_id)?;

        if let Entry::Occupied(mut entry) = self.users.entry(user_id.clone()) {
            entry.get_mut().socket_ids.retain(|id| id != connection_id);
            if entry.get().socket_ids.is_empty() {
                entry.remove();
                debug!(user = %user_id, "Presence: user offline");
            }
        }

        Some(user_id)
    }

    /// Get the record for a user, if they are online.
    #[must_use]
    pub fn lookup(&self, user_id: &str) -> Option<&UserPresence> {
        self.users.get(user_id)
    }

    /// Get the user owning a connection.
    #[must_use]
    pub fn owner(&self, connection_id: &str) -> Option<&str> {
        self.owners.get(connection_id).map(String::as_str)
    }

    /// Check whether a user has at least one live connection.
    #[must_use]
    pub fn is_online(&self, user_id: &str) -> bool {
        self.users.contains_key(user_id)
    }

    /// All records, ordered by user id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<UserPresence> {
        let mut snapshot: Vec<UserPresence> = self.users.values().cloned().collect();
        snapshot.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        snapshot
    }

    /// Number of online users.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Number of registered connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.owners.len()
    }

    /// Check if no user is online.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(registry: &PresenceRegistry, user_id: &str) -> Vec<String> {
        let mut ids = registry.lookup(user_id).unwrap().socket_ids.clone();
        ids.sort();
        ids
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut registry = PresenceRegistry::new();

        assert!(registry.add_connection("u1", "c1"));
        assert!(!registry.add_connection("u1", "c1"));

        assert_eq!(ids(&registry, "u1"), vec!["c1"]);
        assert_eq!(registry.connection_count(), 1);
    }

    #[test]
    fn test_multiple_devices_share_one_record() {
        let mut registry = PresenceRegistry::new();
        registry.add_connection("u1", "c1");
        registry.add_connection("u1", "c2");

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].user_id, "u1");
        assert_eq!(ids(&registry, "u1"), vec!["c1", "c2"]);
    }

    #[test]
    fn test_last_connection_removes_record() {
        let mut registry = PresenceRegistry::new();
        registry.add_connection("u1", "c1");
        registry.add_connection("u1", "c2");

        assert_eq!(registry.remove_connection("c1").as_deref(), Some("u1"));
        assert_eq!(ids(&registry, "u1"), vec!["c2"]);

        assert_eq!(registry.remove_connection("c2").as_deref(), Some("u1"));
        assert!(registry.lookup("u1").is_none());
        assert!(!registry.is_online("u1"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_unknown_connection() {
        let mut registry = PresenceRegistry::new();
        registry.add_connection("u1", "c1");

        assert!(registry.remove_connection("nope").is_none());
        assert_eq!(registry.snapshot(), vec![UserPresence::new("u1", "c1")]);
    }

    #[test]
    fn test_connection_has_single_owner() {
        let mut registry = PresenceRegistry::new();
        registry.add_connection("u1", "c1");
        registry.add_connection("u1", "c2");

        assert!(registry.add_connection("u2", "c1"));

        assert_eq!(registry.owner("c1"), Some("u2"));
        assert_eq!(ids(&registry, "u1"), vec!["c2"]);
        assert_eq!(ids(&registry, "u2"), vec!["c1"]);
        assert_eq!(registry.connection_count(), 2);

        // Moving the only connection away deletes the old record.
        registry.add_connection("u3", "c2");
        assert!(registry.lookup("u1").is_none());
    }

    #[test]
    fn test_snapshot_is_ordered() {
        let mut registry = PresenceRegistry::new();
        registry.add_connection("carol", "c3");
        registry.add_connection("alice", "c1");
        registry.add_connection("bob", "c2");

        let users: Vec<_> = registry
            .snapshot()
            .into_iter()
            .map(|p| p.user_id)
            .collect();
        assert_eq!(users, vec!["alice", "bob", "carol"]);
        assert_eq!(registry.user_count(), 3);
    }
}
