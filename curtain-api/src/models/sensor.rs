use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::clock::{epoch_millis, now_millis};

pub const LIGHT_SENSOR: &str = "light";

/// A single reading published on `sensor/data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorData {
    /// Reading kind, always `light` for the sensing unit
    #[serde(rename = "sensorType")]
    pub kind: String,
    /// Light level within the sensing unit's bounds
    pub value: i32,
    /// Time the reading was taken
    #[serde(rename = "timestamp", with = "epoch_millis")]
    pub observed_at: OffsetDateTime,
}

impl SensorData {
    pub fn light(value: i32) -> Self {
        Self {
            kind: LIGHT_SENSOR.to_string(),
            value,
            observed_at: now_millis(),
        }
    }
}
