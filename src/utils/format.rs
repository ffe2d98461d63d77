//! Display formatting for times and durations

use chrono::{NaiveDateTime, NaiveTime};

/// Wall-clock time as shown on the clock face
pub fn format_clock_time(now: &NaiveDateTime, is_24_hour: bool) -> String {
    if is_24_hour {
        now.format("%H:%M").to_string()
    } else {
        now.format("%I:%M %p").to_string()
    }
}

/// Two-digit seconds of the current minute
pub fn format_seconds(now: &NaiveDateTime) -> String {
    now.format("%S").to_string()
}

/// Long date line, e.g. `Friday, Mar 1`
pub fn format_date(now: &NaiveDateTime) -> String {
    now.format("%A, %b %-d").to_string()
}

/// Stored `HH:mm` alarm time rendered for the configured hour format
pub fn format_alarm_time(time: &str, is_24_hour: bool) -> String {
    if is_24_hour {
        return time.to_string();
    }
    match NaiveTime::parse_from_str(time, "%H:%M") {
        Ok(parsed) => parsed.format("%-I:%M %p").to_string(),
        Err(_) => time.to_string(),
    }
}

/// Stopwatch reading as `mm:ss.cc`
pub fn format_duration(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    let centiseconds = (ms % 1000) / 10;
    format!("{:02}:{:02}.{:02}", minutes, seconds, centiseconds)
}

/// Countdown reading as `mm:ss`, or `h:mm:ss` past an hour
pub fn format_timer_time(total_seconds: u64) -> String {
    let h = total_seconds / 3600;
    let m = (total_seconds % 3600) / 60;
    let s = total_seconds % 60;

    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}
