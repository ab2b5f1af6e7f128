use curtain_api::protocols::CodecError;

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Malformed payload: {0}")]
    Malformed(#[from] CodecError),

    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    #[error("No subscriber on topic {0}")]
    NoSubscriber(String),

    #[error("Channel closed")]
    ChannelClosed,

    #[error("Transport error: {0}")]
    TransportError(#[from] std::io::Error),
}
