use super::{CodecError, Protocol, Result};

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonProtocol;

impl Protocol for JsonProtocol {
    fn serialize<T: serde::Serialize>(&self, data: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(data).map_err(|e| CodecError::Serialization(e.to_string()))
    }

    fn deserialize<T: for<'de> serde::Deserialize<'de>>(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Deserialization(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "json"
    }
}
