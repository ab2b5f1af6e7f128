pub mod json;

pub use json::JsonProtocol;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

pub type Result<T> = core::result::Result<T, CodecError>;

pub trait Protocol: Send + Sync {
    /// Serialize data into bytes
    fn serialize<T: serde::Serialize>(&self, data: &T) -> Result<Vec<u8>>;

    /// Deserialize bytes into data
    fn deserialize<T: for<'de> serde::Deserialize<'de>>(&self, bytes: &[u8]) -> Result<T>;

    /// Get protocol name
    fn name(&self) -> &'static str;
}
