use chrono::{DateTime, Utc};
use concentration_core::Count;

pub(crate) fn utc_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(js_sys::Date::now() as i64).unwrap_or_default()
}

/// Helper function to use JavaScript's Math.random
pub(crate) fn js_random_seed() -> u64 {
    use js_sys::Math::random;
    u64::from_be_bytes(std::array::from_fn(|_| (256. * random()) as u8))
}

/// `MM:SS`, minutes keep growing past an hour.
pub(crate) fn format_clock(elapsed_secs: Count) -> String {
    format!("{:02}:{:02}", elapsed_secs / 60, elapsed_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_pads_minutes_and_seconds() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(9), "00:09");
        assert_eq!(format_clock(75), "01:15");
        assert_eq!(format_clock(3600), "60:00");
    }
}
