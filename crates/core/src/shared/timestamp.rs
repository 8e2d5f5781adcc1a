/// Formats a position in seconds as `M:SS` for reports and console output.
///
/// Minutes are not wrapped into hours; negative or non-finite input is shown
/// as `0:00`.
pub fn format_timestamp(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let whole = seconds.floor() as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::zero(0.0, "0:00")]
    #[case::sub_second(0.9, "0:00")]
    #[case::seconds(7.5, "0:07")]
    #[case::minute(60.0, "1:00")]
    #[case::minutes(754.2, "12:34")]
    #[case::past_hour(3725.0, "62:05")]
    #[case::negative(-3.0, "0:00")]
    #[case::nan(f64::NAN, "0:00")]
    fn test_format_timestamp(#[case] seconds: f64, #[case] expected: &str) {
        assert_eq!(format_timestamp(seconds), expected);
    }
}
