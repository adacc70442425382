/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 2/10/25
******************************************************************************/

//! Wire representation of trades and book events.

use std::fmt;

use crate::engine::book_event::BookEvent;
use crate::engine::trade::Trade;

/// Errors raised while serializing or deserializing a wire event.
#[derive(Debug, Clone)]
pub struct SerializationError {
    message: String,
}

impl SerializationError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "serialization error: {}", self.message)
    }
}

impl std::error::Error for SerializationError {}

impl From<serde_json::Error> for SerializationError {
    fn from(e: serde_json::Error) -> Self {
        SerializationError::new(e.to_string())
    }
}

/// Encodes and decodes trades and book events for external consumers.
/// Separated from the core types so a future wire format can be added
/// without touching `Trade`/`BookEvent` themselves.
pub trait EventSerializer: Send + Sync {
    /// Serializes a trade.
    fn serialize_trade(&self, trade: &Trade) -> Result<Vec<u8>, SerializationError>;
    /// Serializes a book event.
    fn serialize_book_event(&self, event: &BookEvent) -> Result<Vec<u8>, SerializationError>;
    /// Deserializes a trade.
    fn deserialize_trade(&self, bytes: &[u8]) -> Result<Trade, SerializationError>;
    /// Deserializes a book event.
    fn deserialize_book_event(&self, bytes: &[u8]) -> Result<BookEvent, SerializationError>;
    /// MIME content type this serializer produces, for HTTP/NATS headers.
    fn content_type(&self) -> &'static str;
}

/// JSON wire format, via `serde_json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonEventSerializer;

impl EventSerializer for JsonEventSerializer {
    fn serialize_trade(&self, trade: &Trade) -> Result<Vec<u8>, SerializationError> {
        Ok(serde_json::to_vec(trade)?)
    }

    fn serialize_book_event(&self, event: &BookEvent) -> Result<Vec<u8>, SerializationError> {
        Ok(serde_json::to_vec(event)?)
    }

    fn deserialize_trade(&self, bytes: &[u8]) -> Result<Trade, SerializationError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn deserialize_book_event(&self, bytes: &[u8]) -> Result<BookEvent, SerializationError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}
