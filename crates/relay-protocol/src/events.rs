//! Event types for the relay protocol.
//!
//! Every frame is an adjacently tagged object: `{"event": <name>, "data": <payload>}`.
//! Event names and payload field names are part of the client contract and must
//! not change.
//!
//! Routing identities (`receiverId`, `callerId`, `currentUserId`, ...) are
//! required; a payload missing one fails to decode. Everything the relay only
//! passes through (SDP blobs, ICE candidates, file metadata, notification
//! content) is optional and omitted from the outbound payload when absent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::version::Version;

/// Opaque application-level user identity.
pub type UserId = String;

/// Opaque identifier of one live connection.
pub type ConnectionId = String;

/// Presence record as it appears on the wire in `getUsers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPresence {
    /// User identity.
    pub user_id: UserId,
    /// Live connections owned by the user.
    pub socket_ids: Vec<ConnectionId>,
}

impl UserPresence {
    /// Create a record holding a single connection.
    #[must_use]
    pub fn new(user_id: impl Into<UserId>, connection_id: impl Into<ConnectionId>) -> Self {
        Self {
            user_id: user_id.into(),
            socket_ids: vec![connection_id.into()],
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound payloads
// ---------------------------------------------------------------------------

/// `sendOffer`: start a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallOffer {
    pub caller_id: UserId,
    pub receiver_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    /// Session description, forwarded untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer: Option<Value>,
}

/// `sendAnswer`: accept a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallAnswer {
    pub receiver_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<Value>,
}

/// `sendIceCandidate`: trickle one ICE candidate to the peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub receiver_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate: Option<Value>,
}

/// `toggleCamera`: peer turned its camera on or off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraToggle {
    pub receiver_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
}

/// `endCall`: hang up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEnd {
    pub receiver_id: UserId,
    pub sender_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
}

/// `sendMessage`: a chat message, optionally carrying a file or a call summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_duration: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_info: Option<Value>,
}

impl ChatMessage {
    /// Plain text message.
    #[must_use]
    pub fn text(
        sender_id: impl Into<UserId>,
        receiver_id: impl Into<UserId>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            text: Some(text.into()),
            file_url: None,
            file_type: None,
            file_name: None,
            call_type: None,
            call_duration: None,
            call_info: None,
        }
    }
}

/// `seeMessage`: read receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSeen {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub have_seen: bool,
}

/// `updateConversation`: refresh the conversation list of `conversation_owner`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationUpdate {
    pub conversation_owner: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<Value>,
}

/// `blockUser` / `unBlockUser`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRequest {
    pub current_user_id: UserId,
    pub the_blocked_one_id: UserId,
}

/// `sendNotification`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub receiver_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
}

/// `removeNotification`: retract or rewrite a notification already shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRemoval {
    pub receiver_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub for_like_purpose: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friend_request: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
}

/// An event sent by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum InboundEvent {
    /// Announce which user owns the sending connection.
    AddUser(UserId),
    SendOffer(CallOffer),
    SendAnswer(CallAnswer),
    SendIceCandidate(IceCandidate),
    ToggleCamera(CameraToggle),
    EndCall(CallEnd),
    SendMessage(ChatMessage),
    SeeMessage(MessageSeen),
    UpdateConversation(ConversationUpdate),
    BlockUser(BlockRequest),
    #[serde(rename = "unBlockUser")]
    UnblockUser(BlockRequest),
    SendNotification(Notification),
    RemoveNotification(NotificationRemoval),
}

impl InboundEvent {
    /// Wire name of the event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::AddUser(_) => "addUser",
            InboundEvent::SendOffer(_) => "sendOffer",
            InboundEvent::SendAnswer(_) => "sendAnswer",
            InboundEvent::SendIceCandidate(_) => "sendIceCandidate",
            InboundEvent::ToggleCamera(_) => "toggleCamera",
            InboundEvent::EndCall(_) => "endCall",
            InboundEvent::SendMessage(_) => "sendMessage",
            InboundEvent::SeeMessage(_) => "seeMessage",
            InboundEvent::UpdateConversation(_) => "updateConversation",
            InboundEvent::BlockUser(_) => "blockUser",
            InboundEvent::UnblockUser(_) => "unBlockUser",
            InboundEvent::SendNotification(_) => "sendNotification",
            InboundEvent::RemoveNotification(_) => "removeNotification",
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound payloads
// ---------------------------------------------------------------------------

/// Outcome of dialing a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallState {
    /// Callee has no live connection.
    Offline,
}

/// Block relationship as seen by the receiving user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockState {
    #[serde(rename = "blockedByYou")]
    BlockedByYou,
    #[serde(rename = "blockedByThem")]
    BlockedByThem,
    /// No block in either direction.
    #[serde(rename = "")]
    Cleared,
}

/// An event delivered to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum OutboundEvent {
    /// First event on every connection.
    #[serde(rename_all = "camelCase")]
    Connected {
        connection_id: ConnectionId,
        version: Version,
    },

    /// An inbound frame was rejected.
    Error { message: String },

    /// Full presence snapshot.
    GetUsers(Vec<UserPresence>),

    #[serde(rename_all = "camelCase")]
    ReceiveOffer {
        caller_id: UserId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        call_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chat_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offer: Option<Value>,
    },

    /// Sent back to a caller whose callee is offline.
    CallingThem { state: CallState },

    ReceiveAnswer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        answer: Option<Value>,
    },

    ReceiveIceCandidate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        candidate: Option<Value>,
    },

    ToggleCamera {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<Value>,
    },

    #[serde(rename_all = "camelCase")]
    CallEnded {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<Value>,
        sender_id: UserId,
    },

    #[serde(rename_all = "camelCase")]
    GetMessage {
        sender_id: UserId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        call_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        call_duration: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        call_info: Option<Value>,
    },

    #[serde(rename_all = "camelCase")]
    HaveSeenMessage { sender_id: UserId, have_seen: bool },

    #[serde(rename_all = "camelCase")]
    GetConversation {
        conversation_owner: UserId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        receiver_id: Option<UserId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chat_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last_message: Option<Value>,
        is_seen: bool,
    },

    #[serde(rename_all = "camelCase")]
    GetBlockedState {
        state: BlockState,
        the_other_user_id: UserId,
    },

    #[serde(rename = "getUnBlockedState", rename_all = "camelCase")]
    GetUnblockedState {
        state: BlockState,
        the_other_user_id: UserId,
    },

    #[serde(rename_all = "camelCase")]
    GetNotification {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        author_id: Option<UserId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        post_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<Value>,
    },

    #[serde(rename_all = "camelCase")]
    UpdateNotifications {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        author_id: Option<UserId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        post_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        for_like_purpose: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        friend_request: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<Value>,
    },
}

impl OutboundEvent {
    /// Wire name of the event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::Connected { .. } => "connected",
            OutboundEvent::Error { .. } => "error",
            OutboundEvent::GetUsers(_) => "getUsers",
            OutboundEvent::ReceiveOffer { .. } => "receiveOffer",
            OutboundEvent::CallingThem { .. } => "callingThem",
            OutboundEvent::ReceiveAnswer { .. } => "receiveAnswer",
            OutboundEvent::ReceiveIceCandidate { .. } => "receiveIceCandidate",
            OutboundEvent::ToggleCamera { .. } => "toggleCamera",
            OutboundEvent::CallEnded { .. } => "callEnded",
            OutboundEvent::GetMessage { .. } => "getMessage",
            OutboundEvent::HaveSeenMessage { .. } => "haveSeenMessage",
            OutboundEvent::GetConversation { .. } => "getConversation",
            OutboundEvent::GetBlockedState { .. } => "getBlockedState",
            OutboundEvent::GetUnblockedState { .. } => "getUnBlockedState",
            OutboundEvent::GetNotification { .. } => "getNotification",
            OutboundEvent::UpdateNotifications { .. } => "updateNotifications",
        }
    }

    /// Create a `connected` event.
    #[must_use]
    pub fn connected(connection_id: impl Into<ConnectionId>) -> Self {
        OutboundEvent::Connected {
            connection_id: connection_id.into(),
            version: crate::version::PROTOCOL_VERSION,
        }
    }

    /// Create an `error` event.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        OutboundEvent::Error {
            message: message.into(),
        }
    }

    /// `receiveOffer` for the callee.
    #[must_use]
    pub fn incoming_call(offer: CallOffer) -> Self {
        OutboundEvent::ReceiveOffer {
            caller_id: offer.caller_id,
            call_type: offer.call_type,
            chat_id: offer.chat_id,
            offer: offer.offer,
        }
    }

    /// `getMessage` for the receiver.
    #[must_use]
    pub fn message(message: ChatMessage) -> Self {
        OutboundEvent::GetMessage {
            sender_id: message.sender_id,
            text: message.text,
            file_url: message.file_url,
            file_type: message.file_type,
            file_name: message.file_name,
            call_type: message.call_type,
            call_duration: message.call_duration,
            call_info: message.call_info,
        }
    }

    /// `getConversation` for the owner. Always marked unseen.
    #[must_use]
    pub fn conversation(update: ConversationUpdate) -> Self {
        OutboundEvent::GetConversation {
            conversation_owner: update.conversation_owner,
            receiver_id: update.receiver_id,
            chat_id: update.chat_id,
            last_message: update.last_message,
            is_seen: false,
        }
    }

    /// `getNotification` for the receiver.
    #[must_use]
    pub fn notification(notification: Notification) -> Self {
        OutboundEvent::GetNotification {
            author_id: notification.author_id,
            post_id: notification.post_id,
            content: notification.content,
        }
    }

    /// `updateNotifications` for the receiver.
    #[must_use]
    pub fn notification_removal(removal: NotificationRemoval) -> Self {
        OutboundEvent::UpdateNotifications {
            author_id: removal.author_id,
            post_id: removal.post_id,
            for_like_purpose: removal.for_like_purpose,
            friend_request: removal.friend_request,
            content: removal.content,
        }
    }
}
