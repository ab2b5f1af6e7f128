use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::clock::epoch_millis;
use super::CurtainState;

/// Report published on `edge/status` after every processed reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeStatus {
    #[serde(rename = "lightLevel")]
    pub light_level: i32,
    #[serde(rename = "curtainState")]
    pub curtain_state: CurtainState,
    /// Whether the override window suppressed the threshold policy
    #[serde(rename = "ruleActive")]
    pub override_active: bool,
    #[serde(rename = "timestamp", with = "epoch_millis")]
    pub reported_at: OffsetDateTime,
}
