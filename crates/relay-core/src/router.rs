//! Event router for the relay.
//!
//! The router resolves the target users of each inbound event through the
//! presence registry and fans the corresponding outbound event out to every
//! connection those users hold. A target with no live connection is skipped;
//! the only fallback is the "callee offline" status returned to a caller.
//!
//! Every handler runs with the registry lock held, so registry mutation,
//! lookup and the emission they lead to never interleave across events.
//! Sinks are non-blocking, which keeps the critical section short.

use crate::presence::PresenceRegistry;
use crate::sink::{EventSink, Fanout};
use parking_lot::Mutex;
use relay_protocol::{
    BlockRequest, BlockState, CallAnswer, CallEnd, CallOffer, CallState, CameraToggle,
    ChatMessage, ConversationUpdate, IceCandidate, InboundEvent, MessageSeen, Notification,
    NotificationRemoval, OutboundEvent, UserPresence,
};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// The central event router.
pub struct Router<S> {
    /// Online users and their connections.
    registry: Mutex<PresenceRegistry>,
    /// Outbound delivery.
    sink: S,
}

impl<S: EventSink> Router<S> {
    /// Create a router with an empty registry.
    #[must_use]
    pub fn new(sink: S) -> Self {
        info!("Creating router");
        Self {
            registry: Mutex::new(PresenceRegistry::new()),
            sink,
        }
    }

    /// Get the delivery sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Get router statistics.
    #[must_use]
    pub fn stats(&self) -> RouterStats {
        let registry = self.registry.lock();
        RouterStats {
            user_count: registry.user_count(),
            connection_count: registry.connection_count(),
        }
    }

    /// Current presence records, ordered by user id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<UserPresence> {
        self.registry.lock().snapshot()
    }

    /// Get a copy of a user's presence record, if online.
    #[must_use]
    pub fn lookup(&self, user_id: &str) -> Option<UserPresence> {
        self.registry.lock().lookup(user_id).cloned()
    }

    /// Dispatch an inbound event received on `connection_id`.
    pub fn handle(&self, connection_id: &str, event: InboundEvent) -> Fanout {
        trace!(connection = %connection_id, event = event.name(), "Routing event");

        match event {
            InboundEvent::AddUser(user_id) => self.register_presence(connection_id, &user_id),
            InboundEvent::SendOffer(offer) => self.send_offer(offer),
            InboundEvent::SendAnswer(answer) => self.send_answer(answer),
            InboundEvent::SendIceCandidate(candidate) => self.send_ice_candidate(candidate),
            InboundEvent::ToggleCamera(toggle) => self.toggle_camera(toggle),
            InboundEvent::EndCall(end) => self.end_call(end),
            InboundEvent::SendMessage(message) => self.send_message(message),
            InboundEvent::SeeMessage(seen) => self.see_message(seen),
            InboundEvent::UpdateConversation(update) => self.update_conversation(update),
            InboundEvent::BlockUser(request) => self.block_user(request),
            InboundEvent::UnblockUser(request) => self.unblock_user(request),
            InboundEvent::SendNotification(notification) => self.send_notification(notification),
            InboundEvent::RemoveNotification(removal) => self.remove_notification(removal),
        }
    }

    /// Register `connection_id` as belonging to `user_id`, then broadcast
    /// the presence snapshot to everyone.
    pub fn register_presence(&self, connection_id: &str, user_id: &str) -> Fanout {
        let mut registry = self.registry.lock();
        registry.add_connection(user_id, connection_id);
        self.broadcast_presence(&registry)
    }

    /// Forget a closed connection, then broadcast the presence snapshot.
    ///
    /// The snapshot goes out even when the connection was never registered,
    /// so observers always converge on the current state.
    pub fn disconnect(&self, connection_id: &str) -> Fanout {
        let mut registry = self.registry.lock();
        if let Some(user_id) = registry.remove_connection(connection_id) {
            debug!(connection = %connection_id, user = %user_id, "Connection left");
        }
        self.broadcast_presence(&registry)
    }

    /// Ring the receiver. If the receiver is offline, tell every connection
    /// of the caller instead.
    pub fn send_offer(&self, offer: CallOffer) -> Fanout {
        let registry = self.registry.lock();
        let caller_id = offer.caller_id.clone();
        let receiver_id = offer.receiver_id.clone();

        let mut fanout = self.deliver(&registry, &receiver_id, OutboundEvent::incoming_call(offer));
        if fanout.absent > 0 {
            debug!(caller = %caller_id, receiver = %receiver_id, "Callee offline");
            fanout += self.deliver(
                &registry,
                &caller_id,
                OutboundEvent::CallingThem {
                    state: CallState::Offline,
                },
            );
        }
        fanout
    }

    /// Forward a call answer.
    pub fn send_answer(&self, answer: CallAnswer) -> Fanout {
        let registry = self.registry.lock();
        self.deliver(
            &registry,
            &answer.receiver_id,
            OutboundEvent::ReceiveAnswer {
                answer: answer.answer,
            },
        )
    }

    /// Forward an ICE candidate.
    pub fn send_ice_candidate(&self, candidate: IceCandidate) -> Fanout {
        let registry = self.registry.lock();
        self.deliver(
            &registry,
            &candidate.receiver_id,
            OutboundEvent::ReceiveIceCandidate {
                candidate: candidate.candidate,
            },
        )
    }

    /// Forward a camera on/off status.
    pub fn toggle_camera(&self, toggle: CameraToggle) -> Fanout {
        let registry = self.registry.lock();
        self.deliver(
            &registry,
            &toggle.receiver_id,
            OutboundEvent::ToggleCamera {
                status: toggle.status,
            },
        )
    }

    /// Tell the receiver the call is over.
    pub fn end_call(&self, end: CallEnd) -> Fanout {
        let registry = self.registry.lock();
        self.deliver(
            &registry,
            &end.receiver_id,
            OutboundEvent::CallEnded {
                status: end.status,
                sender_id: end.sender_id,
            },
        )
    }

    /// Forward a chat message.
    pub fn send_message(&self, message: ChatMessage) -> Fanout {
        let registry = self.registry.lock();
        let receiver_id = message.receiver_id.clone();
        self.deliver(&registry, &receiver_id, OutboundEvent::message(message))
    }

    /// Forward a read receipt.
    pub fn see_message(&self, seen: MessageSeen) -> Fanout {
        let registry = self.registry.lock();
        self.deliver(
            &registry,
            &seen.receiver_id,
            OutboundEvent::HaveSeenMessage {
                sender_id: seen.sender_id,
                have_seen: seen.have_seen,
            },
        )
    }

    /// Push a conversation list update to its owner.
    pub fn update_conversation(&self, update: ConversationUpdate) -> Fanout {
        let registry = self.registry.lock();
        let owner = update.conversation_owner.clone();
        self.deliver(&registry, &owner, OutboundEvent::conversation(update))
    }

    /// Notify both sides of a new block.
    pub fn block_user(&self, request: BlockRequest) -> Fanout {
        let registry = self.registry.lock();
        let BlockRequest {
            current_user_id,
            the_blocked_one_id,
        } = request;

        let mut fanout = self.deliver(
            &registry,
            &current_user_id,
            OutboundEvent::GetBlockedState {
                state: BlockState::BlockedByYou,
                the_other_user_id: the_blocked_one_id.clone(),
            },
        );
        fanout += self.deliver(
            &registry,
            &the_blocked_one_id,
            OutboundEvent::GetBlockedState {
                state: BlockState::BlockedByThem,
                the_other_user_id: current_user_id,
            },
        );
        fanout
    }

    /// Notify both sides that a block was lifted.
    pub fn unblock_user(&self, request: BlockRequest) -> Fanout {
        let registry = self.registry.lock();
        let BlockRequest {
            current_user_id,
            the_blocked_one_id,
        } = request;

        let mut fanout = self.deliver(
            &registry,
            &current_user_id,
            OutboundEvent::GetUnblockedState {
                state: BlockState::Cleared,
                the_other_user_id: the_blocked_one_id.clone(),
            },
        );
        fanout += self.deliver(
            &registry,
            &the_blocked_one_id,
            OutboundEvent::GetUnblockedState {
                state: BlockState::Cleared,
                the_other_user_id: current_user_id,
            },
        );
        fanout
    }

    /// Forward a notification.
    pub fn send_notification(&self, notification: Notification) -> Fanout {
        let registry = self.registry.lock();
        let receiver_id = notification.receiver_id.clone();
        self.deliver(&registry, &receiver_id, OutboundEvent::notification(notification))
    }

    /// Forward a notification removal or rewrite.
    pub fn remove_notification(&self, removal: NotificationRemoval) -> Fanout {
        let registry = self.registry.lock();
        let receiver_id = removal.receiver_id.clone();
        self.deliver(
            &registry,
            &receiver_id,
            OutboundEvent::notification_removal(removal),
        )
    }

    /// Fan an event out to every connection of `user_id`, or drop it if the
    /// user is offline.
    fn deliver(&self, registry: &PresenceRegistry, user_id: &str, event: OutboundEvent) -> Fanout {
        match registry.lookup(user_id) {
            Some(presence) => {
                let fanout = self.sink.send_all(&presence.socket_ids, Arc::new(event));
                trace!(user = %user_id, recipients = fanout.delivered, "Delivered");
                fanout
            }
            None => {
                debug!(user = %user_id, event = event.name(), "Target offline, dropping");
                Fanout::absent()
            }
        }
    }

    fn broadcast_presence(&self, registry: &PresenceRegistry) -> Fanout {
        let fanout = self
            .sink
            .broadcast(Arc::new(OutboundEvent::GetUsers(registry.snapshot())));
        debug!(
            users = registry.user_count(),
            recipients = fanout.delivered,
            "Broadcast presence"
        );
        fanout
    }
}

/// Router statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterStats {
    /// Number of online users.
    pub user_count: usize,
    /// Number of registered connections.
    pub connection_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::ConnectionHub;
    use crate::sink::DeliveryError;
    use serde_json::json;
    use std::collections::HashSet;

    /// Sink that records every delivery.
    #[derive(Default)]
    struct RecordingSink {
        connected: Mutex<Vec<String>>,
        failing: HashSet<String>,
        sent: Mutex<Vec<(String, OutboundEvent)>>,
    }

    impl RecordingSink {
        fn with_connections(ids: &[&str]) -> Self {
            Self {
                connected: Mutex::new(ids.iter().map(|s| s.to_string()).collect()),
                ..Self::default()
            }
        }

        fn failing(mut self, id: &str) -> Self {
            self.failing.insert(id.to_string());
            self
        }

        fn take(&self) -> Vec<(String, OutboundEvent)> {
            std::mem::take(&mut *self.sent.lock())
        }

        fn events_for(&self, id: &str) -> Vec<OutboundEvent> {
            self.sent
                .lock()
                .iter()
                .filter(|(target, _)| target == id)
                .map(|(_, event)| event.clone())
                .collect()
        }
    }

    impl EventSink for RecordingSink {
        fn send(&self, connection_id: &str, event: Arc<OutboundEvent>) -> Result<(), DeliveryError> {
            if self.failing.contains(connection_id) {
                return Err(DeliveryError::Closed(connection_id.to_string()));
            }
            self.sent
                .lock()
                .push((connection_id.to_string(), (*event).clone()));
            Ok(())
        }

        fn broadcast(&self, event: Arc<OutboundEvent>) -> Fanout {
            let connected = self.connected.lock().clone();
            let mut sent = self.sent.lock();
            for id in &connected {
                sent.push((id.clone(), (*event).clone()));
            }
            Fanout {
                delivered: connected.len(),
                ..Fanout::default()
            }
        }
    }

    fn router(ids: &[&str]) -> Router<RecordingSink> {
        Router::new(RecordingSink::with_connections(ids))
    }

    fn offer(caller: &str, receiver: &str) -> CallOffer {
        CallOffer {
            caller_id: caller.into(),
            receiver_id: receiver.into(),
            call_type: Some("video".into()),
            chat_id: Some("chat-1".into()),
            offer: Some(json!({"type": "offer", "sdp": "v=0"})),
        }
    }

    fn block(current: &str, other: &str) -> BlockRequest {
        BlockRequest {
            current_user_id: current.into(),
            the_blocked_one_id: other.into(),
        }
    }

    #[test]
    fn test_register_broadcasts_snapshot() {
        let router = router(&["c1", "c2", "c3"]);

        router.register_presence("c1", "u1");
        router.register_presence("c2", "u1");

        let sent = router.sink().take();
        // One broadcast per registration, each to all three connections.
        assert_eq!(sent.len(), 6);

        let (_, last) = sent.last().unwrap();
        let OutboundEvent::GetUsers(users) = last else {
            panic!("expected a presence snapshot, got {last:?}");
        };
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].user_id, "u1");
        let ids: HashSet<_> = users[0].socket_ids.iter().cloned().collect();
        assert_eq!(ids, HashSet::from(["c1".to_string(), "c2".to_string()]));
    }

    #[test]
    fn test_disconnect_updates_presence() {
        let router = router(&["c1", "c2"]);
        router.register_presence("c1", "u1");
        router.register_presence("c2", "u1");

        router.disconnect("c1");
        assert_eq!(router.lookup("u1").unwrap().socket_ids, vec!["c2"]);

        router.disconnect("c2");
        assert!(router.lookup("u1").is_none());
        assert_eq!(
            router.stats(),
            RouterStats {
                user_count: 0,
                connection_count: 0
            }
        );
    }

    #[test]
    fn test_disconnect_unknown_still_broadcasts() {
        let router = router(&["c1"]);
        router.register_presence("c1", "u1");
        let before = router.snapshot();
        router.sink().take();

        let fanout = router.disconnect("ghost");

        assert_eq!(router.snapshot(), before);
        assert_eq!(fanout.delivered, 1);
        assert_eq!(
            router.sink().take(),
            vec![("c1".to_string(), OutboundEvent::GetUsers(before))]
        );
    }

    #[test]
    fn test_offer_to_offline_receiver_notifies_caller() {
        let router = router(&[]);
        router.register_presence("c1", "caller");
        router.register_presence("c2", "caller");
        router.register_presence("c3", "bystander");
        router.sink().take();

        let fanout = router.send_offer(offer("caller", "nobody"));

        let offline = OutboundEvent::CallingThem {
            state: CallState::Offline,
        };
        let mut sent = router.sink().take();
        sent.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            sent,
            vec![
                ("c1".to_string(), offline.clone()),
                ("c2".to_string(), offline),
            ]
        );
        assert_eq!(fanout.absent, 1);
        assert_eq!(fanout.delivered, 2);
    }

    #[test]
    fn test_offer_to_online_receiver() {
        let router = router(&[]);
        router.register_presence("c1", "caller");
        router.register_presence("c2", "callee");
        router.register_presence("c3", "callee");
        router.sink().take();

        router.send_offer(offer("caller", "callee"));

        let expected = OutboundEvent::ReceiveOffer {
            caller_id: "caller".into(),
            call_type: Some("video".into()),
            chat_id: Some("chat-1".into()),
            offer: Some(json!({"type": "offer", "sdp": "v=0"})),
        };
        assert_eq!(router.sink().events_for("c2"), vec![expected.clone()]);
        assert_eq!(router.sink().events_for("c3"), vec![expected]);
        assert!(router.sink().events_for("c1").is_empty());
    }

    #[test]
    fn test_offer_from_unregistered_caller_is_dropped() {
        let router = router(&[]);

        let fanout = router.send_offer(offer("ghost", "nobody"));

        assert!(router.sink().take().is_empty());
        assert_eq!(fanout.absent, 2);
        assert!(fanout.is_dropped());
    }

    #[test]
    fn test_block_reaches_blocker_even_if_target_offline() {
        let router = router(&[]);
        router.register_presence("c1", "u1");
        router.sink().take();

        router.block_user(block("u1", "u2"));

        assert_eq!(
            router.sink().take(),
            vec![(
                "c1".to_string(),
                OutboundEvent::GetBlockedState {
                    state: BlockState::BlockedByYou,
                    the_other_user_id: "u2".into(),
                }
            )]
        );
    }

    #[test]
    fn test_block_reaches_both_sides() {
        let router = router(&[]);
        router.register_presence("c1", "u1");
        router.register_presence("c2", "u2");
        router.sink().take();

        router.block_user(block("u1", "u2"));

        assert_eq!(
            router.sink().events_for("c2"),
            vec![OutboundEvent::GetBlockedState {
                state: BlockState::BlockedByThem,
                the_other_user_id: "u1".into(),
            }]
        );
    }

    #[test]
    fn test_block_from_unregistered_user_still_reaches_target() {
        let router = router(&[]);
        router.register_presence("c2", "u2");
        router.sink().take();

        let fanout = router.block_user(block("ghost", "u2"));

        assert_eq!(fanout.absent, 1);
        assert_eq!(
            router.sink().take(),
            vec![(
                "c2".to_string(),
                OutboundEvent::GetBlockedState {
                    state: BlockState::BlockedByThem,
                    the_other_user_id: "ghost".into(),
                }
            )]
        );
    }

    #[test]
    fn test_unblock_clears_both_sides() {
        let router = router(&[]);
        router.register_presence("c1", "u1");
        router.register_presence("c2", "u2");
        router.sink().take();

        router.unblock_user(block("u1", "u2"));

        assert_eq!(
            router.sink().events_for("c1"),
            vec![OutboundEvent::GetUnblockedState {
                state: BlockState::Cleared,
                the_other_user_id: "u2".into(),
            }]
        );
        assert_eq!(
            router.sink().events_for("c2"),
            vec![OutboundEvent::GetUnblockedState {
                state: BlockState::Cleared,
                the_other_user_id: "u1".into(),
            }]
        );
    }

    #[test]
    fn test_conversation_goes_to_owner_unseen() {
        let router = router(&[]);
        router.register_presence("c1", "u1");
        router.register_presence("c2", "u2");
        router.sink().take();

        router.handle(
            "c1",
            InboundEvent::UpdateConversation(ConversationUpdate {
                conversation_owner: "u2".into(),
                receiver_id: Some("u1".into()),
                chat_id: Some("chat-1".into()),
                last_message: Some(json!("hi")),
            }),
        );

        let sent = router.sink().take();
        assert_eq!(sent.len(), 1);
        let (target, event) = &sent[0];
        assert_eq!(target, "c2");
        assert!(matches!(
            event,
            OutboundEvent::GetConversation { is_seen: false, .. }
        ));
    }

    #[test]
    fn test_signaling_events_forward_payloads() {
        let router = router(&[]);
        router.register_presence("c2", "u2");
        router.sink().take();

        router.handle(
            "c1",
            InboundEvent::SendAnswer(CallAnswer {
                receiver_id: "u2".into(),
                answer: Some(json!({"type": "answer"})),
            }),
        );
        router.handle(
            "c1",
            InboundEvent::SendIceCandidate(IceCandidate {
                receiver_id: "u2".into(),
                candidate: Some(json!({"candidate": "a=1"})),
            }),
        );
        router.handle(
            "c1",
            InboundEvent::ToggleCamera(CameraToggle {
                receiver_id: "u2".into(),
                status: Some(json!(false)),
            }),
        );
        router.handle(
            "c1",
            InboundEvent::EndCall(CallEnd {
                receiver_id: "u2".into(),
                sender_id: "u1".into(),
                status: Some(json!("ended")),
            }),
        );
        router.handle(
            "c1",
            InboundEvent::SeeMessage(MessageSeen {
                sender_id: "u1".into(),
                receiver_id: "u2".into(),
                have_seen: true,
            }),
        );

        let names: Vec<_> = router
            .sink()
            .events_for("c2")
            .iter()
            .map(OutboundEvent::name)
            .collect();
        assert_eq!(
            names,
            vec![
                "receiveAnswer",
                "receiveIceCandidate",
                "toggleCamera",
                "callEnded",
                "haveSeenMessage"
            ]
        );
    }

    #[test]
    fn test_unblock_with_offline_target_reaches_blocker_only() {
        let router = router(&[]);
        router.register_presence("c1", "u1");
        router.sink().take();

        let fanout = router.unblock_user(block("u1", "u2"));

        assert_eq!(fanout.delivered, 1);
        assert_eq!(fanout.absent, 1);
        assert_eq!(
            router.sink().take(),
            vec![(
                "c1".to_string(),
                OutboundEvent::GetUnblockedState {
                    state: BlockState::Cleared,
                    the_other_user_id: "u2".into(),
                }
            )]
        );
    }

    #[test]
    fn test_conversation_to_offline_owner_is_dropped() {
        let router = router(&[]);
        router.register_presence("c1", "u1");
        router.sink().take();

        let fanout = router.update_conversation(ConversationUpdate {
            conversation_owner: "u2".into(),
            receiver_id: Some("u1".into()),
            chat_id: Some("chat-1".into()),
            last_message: Some(json!("hi")),
        });

        assert!(fanout.is_dropped());
        assert!(router.sink().take().is_empty());
    }

    #[test]
    fn test_signaling_to_absent_receiver_is_dropped() {
        let router = router(&[]);
        router.register_presence("c1", "u1");
        router.sink().take();

        let events = vec![
            InboundEvent::SendAnswer(CallAnswer {
                receiver_id: "u2".into(),
                answer: Some(json!({"type": "answer"})),
            }),
            InboundEvent::SendIceCandidate(IceCandidate {
                receiver_id: "u2".into(),
                candidate: Some(json!({"candidate": "a=1"})),
            }),
            InboundEvent::ToggleCamera(CameraToggle {
                receiver_id: "u2".into(),
                status: Some(json!(true)),
            }),
            InboundEvent::EndCall(CallEnd {
                receiver_id: "u2".into(),
                sender_id: "u1".into(),
                status: Some(json!("ended")),
            }),
            InboundEvent::SeeMessage(MessageSeen {
                sender_id: "u1".into(),
                receiver_id: "u2".into(),
                have_seen: true,
            }),
            InboundEvent::SendMessage(ChatMessage::text("u1", "u2", "hi")),
        ];

        for event in events {
            let name = event.name();
            let fanout = router.handle("c1", event);
            assert!(fanout.is_dropped(), "{name} was not dropped: {fanout:?}");
        }

        // No fallback reaches the sender.
        assert!(router.sink().take().is_empty());
    }

    #[test]
    fn test_notifications() {
        let router = router(&[]);
        router.register_presence("c2", "u2");
        router.sink().take();

        router.send_notification(Notification {
            receiver_id: "u2".into(),
            author_id: Some("u1".into()),
            post_id: Some("p1".into()),
            content: Some(json!("liked your post")),
        });
        router.remove_notification(NotificationRemoval {
            receiver_id: "u2".into(),
            author_id: Some("u1".into()),
            post_id: Some("p1".into()),
            for_like_purpose: Some(true),
            friend_request: Some(false),
            content: None,
        });

        let events = router.sink().events_for("c2");
        assert_eq!(
            events,
            vec![
                OutboundEvent::GetNotification {
                    author_id: Some("u1".into()),
                    post_id: Some("p1".into()),
                    content: Some(json!("liked your post")),
                },
                OutboundEvent::UpdateNotifications {
                    author_id: Some("u1".into()),
                    post_id: Some("p1".into()),
                    for_like_purpose: Some(true),
                    friend_request: Some(false),
                    content: None,
                },
            ]
        );

        // Offline receiver: nothing goes anywhere.
        let fanout = router.send_notification(Notification {
            receiver_id: "u9".into(),
            author_id: None,
            post_id: None,
            content: None,
        });
        assert!(fanout.is_dropped());
    }

    #[test]
    fn test_failed_connection_does_not_stop_fanout() {
        let router = Router::new(RecordingSink::default().failing("c2"));
        router.register_presence("c1", "u2");
        router.register_presence("c2", "u2");
        router.register_presence("c3", "u2");

        let fanout = router.send_message(ChatMessage::text("u1", "u2", "hi"));

        assert_eq!(fanout.delivered, 2);
        assert_eq!(fanout.failed, 1);
        assert_eq!(router.sink().events_for("c1").len(), 1);
        assert_eq!(router.sink().events_for("c3").len(), 1);
    }

    #[tokio::test]
    async fn test_chat_roundtrip_through_hub() {
        let hub = Arc::new(ConnectionHub::new());
        let router = Router::new(Arc::clone(&hub));
        let mut a = hub.register_with_id("A");
        let mut b = hub.register_with_id("B");

        router.handle("A", InboundEvent::AddUser("u1".into()));
        router.handle("B", InboundEvent::AddUser("u2".into()));
        router.handle(
            "A",
            InboundEvent::SendMessage(ChatMessage::text("u1", "u2", "hi")),
        );

        let mut received = Vec::new();
        while let Ok(event) = b.try_recv() {
            received.push((*event).clone());
        }
        assert!(received.contains(&OutboundEvent::message(ChatMessage::text(
            "u1", "u2", "hi"
        ))));

        // B goes away; the next message has nowhere to go.
        hub.unregister("B");
        drop(b);
        router.disconnect("B");
        while a.try_recv().is_ok() {}

        let fanout = router.handle(
            "A",
            InboundEvent::SendMessage(ChatMessage::text("u1", "u2", "again")),
        );
        assert!(fanout.is_dropped());
        assert!(a.try_recv().is_err());
    }
}
