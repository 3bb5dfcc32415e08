/// Format seconds as `HH:MM:SS` from one hour up, `MM:SS` below.
///
/// Sub-second remainders are truncated. Negative and non-finite input renders
/// as zero.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.trunc() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time_minutes() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(59.999), "00:59");
        assert_eq!(format_time(61.5), "01:01");
        assert_eq!(format_time(3599.9), "59:59");
    }

    #[test]
    fn test_format_time_hours() {
        assert_eq!(format_time(3600.0), "01:00:00");
        assert_eq!(format_time(5025.7), "01:23:45");
        assert_eq!(format_time(36000.0), "10:00:00");
    }

    #[test]
    fn test_format_time_degenerate_input() {
        assert_eq!(format_time(-4.0), "00:00");
        assert_eq!(format_time(f64::NAN), "00:00");
        assert_eq!(format_time(f64::INFINITY), "00:00");
    }
}
