//! Payload handed to message handlers.

use bytes::buf::Reader;
use bytes::{Buf, Bytes};
use serde::de::DeserializeOwned;

use crate::domain::error::PayloadError;

/// Raw payload of an inbound message, decoded on demand.
///
/// Cloning is cheap; the bytes are shared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePayload {
    data: Option<Bytes>,
}

impl MessagePayload {
    /// A message without payload.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps raw bytes.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self {
            data: Some(data.into()),
        }
    }

    /// Returns true if the message carried a payload part, even an empty one.
    pub fn is_present(&self) -> bool {
        self.data.is_some()
    }

    /// Raw bytes, if present.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        self.data.as_ref()
    }

    /// Reader over the raw bytes. Empty if no payload was sent.
    pub fn underlying_stream(&self) -> Reader<Bytes> {
        self.data.clone().unwrap_or_default().reader()
    }

    /// Payload as UTF-8 text.
    pub fn as_text(&self) -> Result<&str, PayloadError> {
        let data = self.data.as_ref().ok_or(PayloadError::Absent)?;
        std::str::from_utf8(data).map_err(|_| PayloadError::NotUtf8)
    }

    /// Decodes the payload as JSON into `T`.
    pub fn read_from_json<T: DeserializeOwned>(&self) -> Result<T, PayloadError> {
        let data = self.data.as_ref().ok_or(PayloadError::Absent)?;
        serde_json::from_slice(data).map_err(|e| PayloadError::Json(e.to_string()))
    }
}

impl From<Option<String>> for MessagePayload {
    fn from(raw: Option<String>) -> Self {
        Self {
            data: raw.map(Bytes::from),
        }
    }
}
