pub mod clock;
pub mod message;
pub mod models;
pub mod protocols;

pub use message::Envelope;
pub use models::*;

/// Pub/sub topic names shared by every role.
pub mod topics {
    /// Light readings from the sensing unit.
    pub const SENSOR_DATA: &str = "sensor/data";
    /// Open/close commands for the actuation unit.
    pub const CURTAIN_CMD: &str = "curtain/cmd";
    /// Decision reports for the remote configurator.
    pub const EDGE_STATUS: &str = "edge/status";
    /// Override rule pushes from the remote configurator.
    pub const RULE_UPDATE: &str = "cloud/ruleUpdate";
}
