//! Human-readable display helpers shared by run headers, reduced-run
//! listings, and the timeline.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Format a byte count as `"<n.nn> <unit>"` using binary multiples.
pub fn format_file_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} PB", size)
}

/// Duration as shown on run headers: sec / min / hours.
pub fn format_duration_long(seconds: f64) -> String {
    format_duration(seconds, "hours")
}

/// Duration as shown in reduced-run listings: sec / min / hr.
pub fn format_duration_short(seconds: f64) -> String {
    format_duration(seconds, "hr")
}

fn format_duration(seconds: f64, hour_unit: &str) -> String {
    if seconds < 60.0 {
        format!("{:.0} sec", seconds)
    } else if seconds < 3600.0 {
        format!("{:.1} min", seconds / 60.0)
    } else {
        format!("{:.1} {}", seconds / 3600.0, hour_unit)
    }
}

/// Count rate in million events per second, or `"N/A"` for zero-length runs.
pub fn format_count_rate(total_counts: u64, duration: f64) -> String {
    if duration > 0.0 {
        format!("{:.3} ME/s", total_counts as f64 / duration / 1e6)
    } else {
        "N/A".to_string()
    }
}

/// Reformat a NeXus ISO timestamp such as `2026-01-30T10:00:00-05:00:00`.
///
/// Only the first 19 characters are parsed, which drops the NeXus-style
/// offset suffix. Unparsable input is returned unchanged.
pub fn format_nexus_timestamp(ts: &str, with_seconds: bool) -> String {
    if ts.is_empty() {
        return "N/A".to_string();
    }
    let head = ts.get(..19).unwrap_or(ts);
    match NaiveDateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S") {
        Ok(dt) if with_seconds => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Ok(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => ts.to_string(),
    }
}

/// Timeline timestamp, e.g. `Jan 30, 2026 10:00 AM`.
pub fn format_entry_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%b %d, %Y %I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_size_units() {
        assert_eq!(format_file_size(512), "512.00 B");
        assert_eq!(format_file_size(2048), "2.00 KB");
        assert_eq!(format_file_size(1_073_741_824), "1.00 GB");
        assert_eq!(format_file_size(1u64 << 50), "1.00 PB");
    }

    #[test]
    fn test_duration_thresholds() {
        assert_eq!(format_duration_long(42.0), "42 sec");
        assert_eq!(format_duration_long(90.0), "1.5 min");
        assert_eq!(format_duration_long(3600.0), "1.0 hours");
        assert_eq!(format_duration_short(7200.0), "2.0 hr");
    }

    #[test]
    fn test_count_rate() {
        assert_eq!(format_count_rate(3_000_000, 2.0), "1.500 ME/s");
        assert_eq!(format_count_rate(100, 0.0), "N/A");
    }

    #[test]
    fn test_nexus_timestamp_strips_offset() {
        assert_eq!(
            format_nexus_timestamp("2026-01-30T10:00:00-05:00:00", true),
            "2026-01-30 10:00:00"
        );
        assert_eq!(
            format_nexus_timestamp("2026-01-30T10:00:00-05:00:00", false),
            "2026-01-30 10:00"
        );
        assert_eq!(format_nexus_timestamp("", true), "N/A");
        assert_eq!(format_nexus_timestamp("yesterday", true), "yesterday");
    }

    #[test]
    fn test_entry_timestamp_has_meridiem() {
        let dt = Utc.with_ymd_and_hms(2026, 1, 30, 15, 4, 0).unwrap();
        assert_eq!(format_entry_timestamp(&dt), "Jan 30, 2026 03:04 PM");
    }
}
