//! # relay-protocol
//!
//! Wire protocol definitions for the relay presence and signaling server.
//!
//! Clients and the server exchange named events. Each frame is a JSON text
//! message (or its MessagePack equivalent in a binary message) of the form
//! `{"event": "<name>", "data": <payload>}`.
//!
//! ## Event groups
//!
//! - `addUser` / `getUsers` - Presence registration and snapshots
//! - `sendOffer`, `sendAnswer`, `sendIceCandidate`, `toggleCamera`, `endCall` - Call signaling
//! - `sendMessage`, `seeMessage`, `updateConversation` - Messaging
//! - `blockUser`, `unBlockUser`, `sendNotification`, `removeNotification` - Social state
//!
//! ## Example
//!
//! ```rust
//! use relay_protocol::{codec, ChatMessage, InboundEvent, WireFormat};
//!
//! let event = InboundEvent::SendMessage(ChatMessage::text("u1", "u2", "hi"));
//!
//! let encoded = codec::encode(&event, WireFormat::Json).unwrap();
//! if let codec::EncodedFrame::Text(text) = encoded {
//!     let decoded: InboundEvent = codec::decode_text(&text).unwrap();
//!     assert_eq!(decoded, event);
//! }
//! ```

pub mod codec;
pub mod events;
pub mod version;

pub use codec::{EncodedFrame, FrameCodec, ProtocolError, WireFormat};
pub use events::{
    BlockRequest, BlockState, CallAnswer, CallEnd, CallOffer, CallState, CameraToggle,
    ChatMessage, ConnectionId, ConversationUpdate, IceCandidate, InboundEvent, MessageSeen,
    Notification, NotificationRemoval, OutboundEvent, UserId, UserPresence,
};
pub use version::{Version, PROTOCOL_VERSION};
