use chrono::{DateTime, TimeZone, Utc};

/// Resolution of a time tick label. Coarser spans drop the clock part,
/// finer spans drop the date part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeLabel {
    Year,
    /// 2000-01
    Month,
    /// 2000-01-15
    Day,
    /// 2000-01-15 10:30
    DayMinute,
    /// 10:30
    Minute,
    /// 10:30:15
    Second,
    /// 10:30:15.250
    Millis,
}

const MINUTE: f64 = 60.0;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;

/// Label resolution for an axis spanning `span_sec` seconds.
pub fn label_for_span(span_sec: f64) -> TimeLabel {
    match span_sec {
        s if s > 730.0 * DAY => TimeLabel::Year,
        s if s > 60.0 * DAY => TimeLabel::Month,
        s if s > 3.0 * DAY => TimeLabel::Day,
        s if s > DAY => TimeLabel::DayMinute,
        s if s > 5.0 * MINUTE => TimeLabel::Minute,
        s if s > 5.0 => TimeLabel::Second,
        _ => TimeLabel::Millis,
    }
}

fn to_datetime(unix_seconds: f64) -> Option<DateTime<Utc>> {
    let whole = unix_seconds.floor();
    let nanos = ((unix_seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
    Utc.timestamp_opt(whole as i64, nanos).single()
}

/// Formats seconds since 1970 (UTC). Out-of-range instants fall back to
/// the raw number.
pub fn format_time(unix_seconds: f64, label: TimeLabel) -> String {
    let Some(dt) = to_datetime(unix_seconds) else {
        return format!("{unix_seconds:.2}");
    };
    let pattern = match label {
        TimeLabel::Year => "%Y",
        TimeLabel::Month => "%Y-%m",
        TimeLabel::Day => "%Y-%m-%d",
        TimeLabel::DayMinute => "%Y-%m-%d %H:%M",
        TimeLabel::Minute => "%H:%M",
        TimeLabel::Second => "%H:%M:%S",
        TimeLabel::Millis => "%H:%M:%S%.3f",
    };
    dt.format(pattern).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picks_coarser_labels_for_longer_spans() {
        assert_eq!(label_for_span(1.0), TimeLabel::Millis);
        assert_eq!(label_for_span(3600.0), TimeLabel::Minute);
        assert_eq!(label_for_span(10.0 * DAY), TimeLabel::Day);
        assert_eq!(label_for_span(3000.0 * DAY), TimeLabel::Year);
    }

    #[test]
    fn test_formats_iso_dates() {
        // 2000-01-15T10:30:15.25Z
        let t = 947_932_215.25;
        assert_eq!(format_time(t, TimeLabel::Day), "2000-01-15");
        assert_eq!(format_time(t, TimeLabel::DayMinute), "2000-01-15 10:30");
        assert_eq!(format_time(t, TimeLabel::Millis), "10:30:15.250");
    }
}
