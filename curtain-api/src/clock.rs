use time::macros::format_description;
use time::{OffsetDateTime, Time};

/// Zero-padded 24h `HH:MM` rendering used for lexical window comparison.
pub fn hh_mm(time: Time) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// Parses a strict `HH:MM` token.
pub fn parse_hh_mm(input: &str) -> Option<Time> {
    if input.len() != 5 {
        return None;
    }

    Time::parse(input, format_description!("[hour]:[minute]")).ok()
}

pub fn is_hh_mm(input: &str) -> bool {
    parse_hh_mm(input).is_some()
}

/// Serde adapter storing an [`OffsetDateTime`] as Unix epoch milliseconds.
pub mod epoch_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;

    pub fn serialize<S: Serializer>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64((value.unix_timestamp_nanos() / 1_000_000) as i64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OffsetDateTime, D::Error> {
        let millis = i64::deserialize(deserializer)?;

        OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000)
            .map_err(serde::de::Error::custom)
    }
}

/// Current time truncated to millisecond precision so it survives the wire.
pub fn now_millis() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(now.millisecond() as u32 * 1_000_000)
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use time::macros::{datetime, time};

    use super::*;

    #[test]
    fn test_hh_mm_is_zero_padded() {
        assert_eq!(hh_mm(time!(7:05)), "07:05");
        assert_eq!(hh_mm(time!(23:59:59)), "23:59");
        assert_eq!(hh_mm(time!(0:00)), "00:00");
    }

    #[test]
    fn test_parse_hh_mm() {
        assert_eq!(parse_hh_mm("08:30"), Some(time!(8:30)));
        assert!(is_hh_mm("00:00"));
        assert!(is_hh_mm("23:59"));
        assert!(!is_hh_mm("24:00"));
        assert!(!is_hh_mm("8:30"));
        assert!(!is_hh_mm("08:60"));
        assert!(!is_hh_mm("08:30:00"));
        assert!(!is_hh_mm("noon"));
    }

    #[test]
    fn test_epoch_millis_wire_shape() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Stamp {
            #[serde(with = "epoch_millis")]
            at: OffsetDateTime,
        }

        let stamp = Stamp { at: datetime!(2024-01-01 00:00:00.250 UTC) };
        let json = serde_json::to_string(&stamp).unwrap();
        assert_eq!(json, r#"{"at":1704067200250}"#);

        let back: Stamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back.at, stamp.at);
    }
}
