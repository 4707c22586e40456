//! # relay-core
//!
//! Presence tracking and event routing for the relay.
//!
//! This crate provides the fundamental building blocks:
//!
//! - **Presence** - Which connections belong to which user
//! - **Router** - Per-event fanout rules over current presence
//! - **Sink** - Outbound delivery abstraction
//! - **Hub** - In-process sink backed by per-connection queues
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Connection │────▶│   Router    │────▶│    Sink     │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │
//!                            ▼
//!                     ┌─────────────┐
//!                     │  Presence   │
//!                     └─────────────┘
//! ```

pub mod hub;
pub mod presence;
pub mod router;
pub mod sink;

pub use hub::{generate_connection_id, ConnectionHub, Outbox};
pub use presence::PresenceRegistry;
pub use router::{Router, RouterStats};
pub use sink::{DeliveryError, EventSink, Fanout};
