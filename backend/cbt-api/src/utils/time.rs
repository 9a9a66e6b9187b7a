/// Formats a duration in seconds as `MM:SS`, both fields zero-padded.
/// Minutes are not capped at 59.
pub fn format_time(seconds: u32) -> String {
    let mins = seconds / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}", mins, secs)
}

#[cfg(test)]
mod tests {
    use super::format_time;

    #[test]
    fn pads_both_fields() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(5), "00:05");
        assert_eq!(format_time(65), "01:05");
        assert_eq!(format_time(600), "10:00");
    }

    #[test]
    fn minutes_may_exceed_fifty_nine() {
        assert_eq!(format_time(3600), "60:00");
        assert_eq!(format_time(3661), "61:01");
    }
}
