//! Fixed-width clock rendering for task timing fields.
//!
//! Every duration is rendered as `DD HH:MM:SS.mmm`. The day field is at least
//! two digits wide and grows as needed; the other fields are bounded by their
//! unit. Milliseconds are rounded to the nearest value *before* the
//! decomposition so a carry (e.g. `59.9996s`) rolls into the next second
//! instead of producing a `1000` millisecond field.

use std::time::Duration;

const MILLIS_PER_SEC: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const SECS_PER_DAY: u128 = 86_400;
const SECS_PER_HOUR: u128 = 3_600;
const SECS_PER_MIN: u128 = 60;

/// Formats a [`Duration`] as `DD HH:MM:SS.mmm`.
pub fn format_duration(duration: Duration) -> String {
    let millis = (duration.as_nanos() + NANOS_PER_MILLI / 2) / NANOS_PER_MILLI;
    format_millis(millis)
}

/// Formats a number of seconds as `DD HH:MM:SS.mmm`.
///
/// Negative, NaN and infinite inputs are clamped to zero. Finite values too
/// large to be represented saturate.
pub fn format_seconds(secs: f64) -> String {
    if !secs.is_finite() || secs <= 0.0 {
        return format_millis(0);
    }

    let millis = secs * MILLIS_PER_SEC as f64;
    let millis = if millis.is_finite() {
        millis.round() as u128
    } else {
        u128::MAX
    };
    format_millis(millis)
}

fn format_millis(total_millis: u128) -> String {
    let millis = total_millis % MILLIS_PER_SEC;
    let mut secs = total_millis / MILLIS_PER_SEC;

    let days = secs / SECS_PER_DAY;
    secs %= SECS_PER_DAY;

    let hours = secs / SECS_PER_HOUR;
    secs %= SECS_PER_HOUR;

    let mins = secs / SECS_PER_MIN;
    secs %= SECS_PER_MIN;

    format!("{days:02} {hours:02}:{mins:02}:{secs:02}.{millis:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Splits a rendered clock into its numeric fields, checking the layout.
    fn fields(s: &str) -> (u128, u32, u32, u32, u32) {
        let (days, clock) = s.split_once(' ').expect("missing day separator");
        let (hms, millis) = clock.split_once('.').expect("missing millis separator");
        let parts: Vec<&str> = hms.split(':').collect();

        assert!(days.len() >= 2, "day field too short in {s}");
        assert_eq!(parts.len(), 3, "bad clock in {s}");
        assert!(parts.iter().all(|p| p.len() == 2), "bad clock width in {s}");
        assert_eq!(millis.len(), 3, "bad millis width in {s}");

        (
            days.parse().unwrap(),
            parts[0].parse().unwrap(),
            parts[1].parse().unwrap(),
            parts[2].parse().unwrap(),
            millis.parse().unwrap(),
        )
    }

    #[test]
    fn zero() {
        assert_eq!(format_seconds(0.0), "00 00:00:00.000");
        assert_eq!(format_duration(Duration::ZERO), "00 00:00:00.000");
    }

    #[test]
    fn hour_minute_second_and_half() {
        assert_eq!(format_seconds(3661.5), "00 01:01:01.500");
        assert_eq!(
            format_duration(Duration::from_millis(3_661_500)),
            "00 01:01:01.500"
        );
    }

    #[test]
    fn exactly_one_day() {
        assert_eq!(format_seconds(86_400.0), "01 00:00:00.000");
        assert_eq!(format_duration(Duration::from_secs(86_400)), "01 00:00:00.000");
    }

    #[test]
    fn millisecond_rounding_carries_into_seconds() {
        assert_eq!(format_seconds(59.9996), "00 00:01:00.000");
        assert_eq!(
            format_duration(Duration::new(59, 999_999_600)),
            "00 00:01:00.000"
        );
    }

    #[test]
    fn carry_propagates_into_days() {
        assert_eq!(format_seconds(86_399.9996), "01 00:00:00.000");
        assert_eq!(
            format_duration(Duration::new(86_399, 999_600_000)),
            "01 00:00:00.000"
        );
    }

    #[test]
    fn rounds_instead_of_truncating() {
        assert_eq!(format_duration(Duration::new(1, 1_499_999)), "00 00:00:01.001");
        assert_eq!(format_duration(Duration::new(1, 1_500_000)), "00 00:00:01.002");
        assert_eq!(format_seconds(0.0004), "00 00:00:00.000");
        assert_eq!(format_seconds(0.0006), "00 00:00:00.001");
    }

    #[test]
    fn day_field_grows_past_two_digits() {
        assert_eq!(
            format_duration(Duration::from_secs(100 * 86_400)),
            "100 00:00:00.000"
        );
        assert_eq!(
            format_duration(Duration::from_secs(1_234 * 86_400 + 3_599)),
            "1234 00:59:59.000"
        );
    }

    #[test]
    fn invalid_seconds_clamp_to_zero() {
        for secs in [-1.0, -0.0004, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(format_seconds(secs), "00 00:00:00.000", "input {secs}");
        }
    }

    #[test]
    fn huge_seconds_saturate_without_panicking() {
        let saturated = format_millis(u128::MAX);
        for secs in [f64::MAX / 10_000.0, 1e306, f64::MAX] {
            let s = format_seconds(secs);
            assert_ne!(s, "00 00:00:00.000", "input {secs}");
            let (_, h, m, sec, ms) = fields(&s);
            assert!(h < 24 && m < 60 && sec < 60 && ms < 1000);
        }
        assert_eq!(format_seconds(1e306), saturated);
        assert_eq!(format_seconds(f64::MAX), saturated);
    }

    #[test]
    fn fields_stay_in_range() {
        let mut nanos: u128 = 0;
        while nanos < 3 * 86_400 * 1_000_000_000 {
            let d = Duration::from_nanos(nanos as u64);
            let s = format_duration(d);
            let (days, h, m, sec, ms) = fields(&s);

            assert!(h <= 23, "hours out of range in {s}");
            assert!(m <= 59, "minutes out of range in {s}");
            assert!(sec <= 59, "seconds out of range in {s}");
            assert!(ms <= 999, "millis out of range in {s}");

            let rebuilt = ((days * 86_400
                + h as u128 * 3_600
                + m as u128 * 60
                + sec as u128)
                * 1_000)
                + ms as u128;
            let expected = (nanos + 500_000) / 1_000_000;
            assert_eq!(rebuilt, expected, "wrong value in {s}");

            nanos += 7_919_999_937;
        }
    }
}
