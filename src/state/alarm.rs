//! Alarm records and the per-tick alarm matcher

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{ClockError, Result};

/// Label given to alarms created without one
pub const DEFAULT_ALARM_LABEL: &str = "Alarm";

/// A user alarm. `time` is always stored as 24-hour `HH:mm`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub id: String,
    pub time: String,
    pub label: String,
    pub is_active: bool,
}

impl Alarm {
    /// Create an active alarm, normalizing `time` to `HH:mm`
    pub fn new(id: String, time: &str, label: Option<String>) -> Result<Self> {
        let label = label
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_ALARM_LABEL.to_string());

        Ok(Self {
            id,
            time: normalize_alarm_time(time)?,
            label,
            is_active: true,
        })
    }
}

/// Parse a user-entered `H:mm`/`HH:mm` time and return it as `HH:mm`
pub fn normalize_alarm_time(input: &str) -> Result<String> {
    let trimmed = input.trim();
    let (hours, minutes) = trimmed
        .split_once(':')
        .ok_or_else(|| ClockError::invalid_input(format!("alarm time '{}' is not HH:mm", input)))?;

    let parse = |part: &str, max: u32, what: &str| -> Result<u32> {
        let ok = !part.is_empty() && part.len() <= 2 && part.bytes().all(|b| b.is_ascii_digit());
        let value = if ok { part.parse::<u32>().ok() } else { None };
        value
            .filter(|v| *v <= max)
            .ok_or_else(|| ClockError::invalid_input(format!("invalid {} in alarm time '{}'", what, input)))
    };

    let hours = parse(hours, 23, "hour")?;
    if minutes.len() != 2 {
        return Err(ClockError::invalid_input(format!("alarm time '{}' is not HH:mm", input)));
    }
    let minutes = parse(minutes, 59, "minute")?;

    let time = NaiveTime::from_hms_opt(hours, minutes, 0)
        .ok_or_else(|| ClockError::invalid_input(format!("alarm time '{}' is out of range", input)))?;
    Ok(time.format("%H:%M").to_string())
}

/// Return the alarm that should start ringing at `now`, if any.
///
/// Only fires at second 0, only when nothing is ringing, and only the first
/// active alarm in list order whose time equals the current `HH:mm`.
pub fn find_due_alarm<'a>(alarms: &'a [Alarm], now: &NaiveDateTime, ringing: bool) -> Option<&'a Alarm> {
    if ringing || now.second() != 0 {
        return None;
    }
    let current = now.format("%H:%M").to_string();
    alarms.iter().find(|alarm| alarm.is_active && alarm.time == current)
}

/// Keep alarms ordered by time of day
pub fn sort_alarms(alarms: &mut [Alarm]) {
    alarms.sort_by(|a, b| a.time.cmp(&b.time));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    fn alarm(id: &str, time: &str, active: bool) -> Alarm {
        Alarm {
            id: id.to_string(),
            time: time.to_string(),
            label: DEFAULT_ALARM_LABEL.to_string(),
            is_active: active,
        }
    }

    #[test]
    fn normalizes_to_two_digit_hours() {
        assert_eq!(normalize_alarm_time("7:05").unwrap(), "07:05");
        assert_eq!(normalize_alarm_time(" 23:59 ").unwrap(), "23:59");
        assert_eq!(normalize_alarm_time("00:00").unwrap(), "00:00");
    }

    #[test]
    fn rejects_malformed_times() {
        for bad in ["", "7", "24:00", "12:60", "12:5", "ab:cd", "-1:00", "12:00:00", "7:05 PM"] {
            assert!(
                matches!(normalize_alarm_time(bad), Err(ClockError::InvalidInput(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn blank_label_gets_default() {
        let alarm = Alarm::new("1".to_string(), "6:30", Some("  ".to_string())).unwrap();
        assert_eq!(alarm.label, DEFAULT_ALARM_LABEL);
        assert_eq!(alarm.time, "06:30");
        assert!(alarm.is_active);
    }

    #[test]
    fn only_the_active_alarm_matches() {
        let alarms = vec![alarm("inactive", "07:00", false), alarm("active", "07:00", true)];

        let due = find_due_alarm(&alarms, &at(7, 0, 0), false).unwrap();
        assert_eq!(due.id, "active");
    }

    #[test]
    fn first_match_in_list_order_wins() {
        let alarms = vec![alarm("a", "07:00", true), alarm("b", "07:00", true)];

        assert_eq!(find_due_alarm(&alarms, &at(7, 0, 0), false).unwrap().id, "a");
    }

    #[test]
    fn no_match_off_second_zero_or_while_ringing() {
        let alarms = vec![alarm("a", "07:00", true)];

        assert!(find_due_alarm(&alarms, &at(7, 0, 1), false).is_none());
        assert!(find_due_alarm(&alarms, &at(7, 0, 0), true).is_none());
        assert!(find_due_alarm(&alarms, &at(7, 1, 0), false).is_none());
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let json = serde_json::to_value(alarm("1", "07:00", true)).unwrap();
        assert_eq!(json["isActive"], true);
        assert_eq!(json["time"], "07:00");
    }
}
