use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::clock::{epoch_millis, now_millis};

/// Time-of-day interval during which automatic control is suppressed.
///
/// Window bounds are compared as zero-padded `HH:MM` strings, so a window whose
/// start is after its end (crossing midnight) is never active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurtainRule {
    #[serde(rename = "ruleId")]
    pub id: String,
    /// Inclusive start, `HH:MM`
    #[serde(rename = "startTime")]
    pub window_start: String,
    /// Exclusive end, `HH:MM`
    #[serde(rename = "endTime")]
    pub window_end: String,
    pub enabled: bool,
}

impl CurtainRule {
    pub fn new(id: impl Into<String>, window_start: impl Into<String>, window_end: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            window_start: window_start.into(),
            window_end: window_end.into(),
            enabled: true,
        }
    }

    /// Whether `now` (`HH:MM`) falls in `[window_start, window_end)`.
    pub fn covers(&self, now: &str) -> bool {
        self.enabled && self.window_start.as_str() <= now && now < self.window_end.as_str()
    }

    pub fn crosses_midnight(&self) -> bool {
        self.window_start > self.window_end
    }
}

/// Envelope published on `cloud/ruleUpdate`, carrying exactly one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleUpdate {
    pub rule: CurtainRule,
    #[serde(rename = "timestamp", with = "epoch_millis")]
    pub sent_at: OffsetDateTime,
}

impl ScheduleUpdate {
    pub fn new(rule: CurtainRule) -> Self {
        Self {
            rule,
            sent_at: now_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_is_half_open() {
        let rule = CurtainRule::new("r1", "08:00", "10:00");

        assert!(!rule.covers("07:59"));
        assert!(rule.covers("08:00"));
        assert!(rule.covers("09:59"));
        assert!(!rule.covers("10:00"));
    }

    #[test]
    fn test_disabled_rule_never_covers() {
        let mut rule = CurtainRule::new("r1", "00:00", "23:59");
        rule.enabled = false;

        assert!(!rule.covers("12:00"));
    }

    #[test]
    fn test_midnight_window_never_covers() {
        let rule = CurtainRule::new("night", "22:00", "06:00");

        assert!(rule.crosses_midnight());
        assert!(!rule.covers("23:00"));
        assert!(!rule.covers("02:00"));
    }

    #[test]
    fn test_parse_wire_update() {
        let update: ScheduleUpdate = serde_json::from_str(
            r#"{"rule":{"ruleId":"morning_rule","startTime":"07:00","endTime":"09:00","enabled":false},"timestamp":1700000000000}"#,
        )
        .unwrap();

        assert_eq!(update.rule.id, "morning_rule");
        assert_eq!(update.rule.window_start, "07:00");
        assert!(!update.rule.enabled);
    }

    #[test]
    fn test_update_without_rule_is_rejected() {
        assert!(serde_json::from_str::<ScheduleUpdate>(r#"{"timestamp":1}"#).is_err());
    }
}
