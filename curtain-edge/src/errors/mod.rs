pub mod message;

pub use message::MessageError;
