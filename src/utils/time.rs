use chrono::{NaiveDateTime, Timelike};
use regex::Regex;
use std::sync::LazyLock;

static TIME_OF_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+):(\d+)\s*(am|pm)?").expect("time-of-day pattern is valid")
});

/// Parses `"6:30 pm"`, `"12:00 am"` or `"14:05"` into a 24-hour `(hour, minute)`.
///
/// Without an am/pm marker the hour is taken as already being 24-hour.
/// Returns `None` when nothing time-like is found or the result is out of range.
pub fn to_24h(text: &str) -> Option<(u32, u32)> {
    let captures = TIME_OF_DAY.captures(text)?;
    let mut hour: u32 = captures[1].parse().ok()?;
    let minute: u32 = captures[2].parse().ok()?;

    if let Some(marker) = captures.get(3) {
        let pm = marker.as_str().eq_ignore_ascii_case("pm");
        if !pm && hour == 12 {
            hour = 0;
        }
        if pm && hour < 12 {
            hour += 12;
        }
    }

    (hour < 24 && minute < 60).then_some((hour, minute))
}

/// Drops seconds and sub-second precision.
pub fn truncate_to_minute(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_twelve_hour_times() {
        assert_eq!(to_24h("6:30 am"), Some((6, 30)));
        assert_eq!(to_24h("6:30 pm"), Some((18, 30)));
        assert_eq!(to_24h("12:00 am"), Some((0, 0)));
        assert_eq!(to_24h("12:00 pm"), Some((12, 0)));
        assert_eq!(to_24h("11:59 PM"), Some((23, 59)));
        assert_eq!(to_24h("7:05AM"), Some((7, 5)));
    }

    #[test]
    fn test_twenty_four_hour_times() {
        assert_eq!(to_24h("14:05"), Some((14, 5)));
        assert_eq!(to_24h("00:00"), Some((0, 0)));
        assert_eq!(to_24h("at 9:15"), Some((9, 15)));
    }

    #[test]
    fn test_unparseable_times() {
        assert_eq!(to_24h(""), None);
        assert_eq!(to_24h("noon"), None);
        assert_eq!(to_24h("25:00"), None);
        assert_eq!(to_24h("10:75 pm"), None);
    }

    #[test]
    fn test_truncate_to_minute() {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_milli_opt(22, 0, 41, 500)
            .unwrap();
        let truncated = truncate_to_minute(ts);
        assert_eq!(truncated.second(), 0);
        assert_eq!(truncated.nanosecond(), 0);
        assert_eq!(truncated.minute(), 0);
        assert_eq!(truncated.hour(), 22);
    }
}
