use curtain_api::protocols::CodecError;

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("Connection unavailable")]
    NotConnected,

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown message type: {0}")]
    UnknownType(String),
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command, please use: enable, disable, time, status, exit")]
    Unknown,

    #[error("Invalid time {0}, expected HH:MM")]
    InvalidTime(String),
}
