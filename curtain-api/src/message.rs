use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocols::{CodecError, JsonProtocol, Protocol, Result};

/// Frame exchanged over the remote link: one topic message per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Topic the payload belongs to
    #[serde(rename = "type")]
    pub topic: String,
    pub payload: Value,
}

impl Envelope {
    pub fn wrap<T: Serialize>(topic: &str, payload: &T) -> Result<Self> {
        let payload = serde_json::to_value(payload).map_err(|e| CodecError::Serialization(e.to_string()))?;

        Ok(Self {
            topic: topic.to_string(),
            payload,
        })
    }

    /// Serialized payload, as it would travel on the topic itself.
    pub fn payload_bytes(&self) -> Result<Vec<u8>> {
        JsonProtocol.serialize(&self.payload)
    }

    pub fn payload_as<T: for<'de> Deserialize<'de>>(&self) -> Result<T> {
        T::deserialize(&self.payload).map_err(|e| CodecError::Deserialization(e.to_string()))
    }

    /// Encodes the envelope as a single newline-terminated line.
    pub fn to_line(&self) -> Result<Vec<u8>> {
        let mut bytes = JsonProtocol.serialize(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    pub fn from_line(line: &str) -> Result<Self> {
        JsonProtocol.deserialize(line.trim().as_bytes())
    }
}
