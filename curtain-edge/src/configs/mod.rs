pub mod settings;

pub use settings::{Actuator, Gateway, Logger, Sensor, Settings};
