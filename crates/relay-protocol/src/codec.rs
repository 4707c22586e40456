//! Codec for encoding and decoding relay events.
//!
//! Text WebSocket messages carry JSON. Binary messages carry MessagePack with
//! named fields, so both encodings share the same field names.
//!
//! The frame size limit bounds what clients may send. Outbound frames are not
//! capped: a presence snapshot grows with the number of users online and must
//! always reach every connection.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Default maximum frame size (1 MB).
pub const MAX_FRAME_SIZE: usize = 1_000_000;

/// Protocol errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame exceeds maximum size.
    #[error("Frame size {size} exceeds maximum {max}")]
    FrameTooLarge { size: usize, max: usize },

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MessagePack encoding error.
    #[error("Encoding error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// MessagePack decoding error.
    #[error("Decoding error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// Encoding used on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    /// JSON in text messages.
    #[default]
    Json,
    /// MessagePack in binary messages.
    MessagePack,
}

/// An encoded frame, ready to be wrapped in a WebSocket message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedFrame {
    Text(String),
    Binary(Bytes),
}

impl EncodedFrame {
    /// Encoded size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            EncodedFrame::Text(text) => text.len(),
            EncodedFrame::Binary(data) => data.len(),
        }
    }

    /// Whether the frame is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_size(size: usize, max: usize) -> Result<(), ProtocolError> {
    if size > max {
        return Err(ProtocolError::FrameTooLarge { size, max });
    }
    Ok(())
}

/// Encode an event in the given format.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn encode<T: Serialize>(event: &T, format: WireFormat) -> Result<EncodedFrame, ProtocolError> {
    FrameCodec::default().encode(event, format)
}

/// Decode an event from a JSON text frame.
///
/// # Errors
///
/// Returns an error if the frame is too large or does not describe a known event.
pub fn decode_text<T: DeserializeOwned>(text: &str) -> Result<T, ProtocolError> {
    FrameCodec::default().decode_text(text)
}

/// Decode an event from a MessagePack binary frame.
///
/// # Errors
///
/// Returns an error if the frame is too large or does not describe a known event.
pub fn decode_binary<T: DeserializeOwned>(data: &[u8]) -> Result<T, ProtocolError> {
    FrameCodec::default().decode_binary(data)
}

/// Codec with a configurable frame size limit.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_frame_size: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(MAX_FRAME_SIZE)
    }
}

impl FrameCodec {
    /// Create a codec that rejects inbound frames above `max_frame_size` bytes.
    #[must_use]
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    /// Get the frame size limit.
    #[must_use]
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Encode an event. The size limit does not apply.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode<T: Serialize>(
        &self,
        event: &T,
        format: WireFormat,
    ) -> Result<EncodedFrame, ProtocolError> {
        Ok(match format {
            WireFormat::Json => EncodedFrame::Text(serde_json::to_string(event)?),
            WireFormat::MessagePack => {
                EncodedFrame::Binary(Bytes::from(rmp_serde::to_vec_named(event)?))
            }
        })
    }

    /// Decode a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is too large or invalid.
    pub fn decode_text<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError> {
        check_size(text.len(), self.max_frame_size)?;
        Ok(serde_json::from_str(text)?)
    }

    /// Decode a MessagePack binary frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is too large or invalid.
    pub fn decode_binary<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        check_size(data.len(), self.max_frame_size)?;
        Ok(rmp_serde::from_slice(data)?)
    }
}
