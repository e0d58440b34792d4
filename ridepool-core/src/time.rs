//! Helpers for mixing `chrono` instants with `std` durations.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Elapsed time from `from` to `to`, clamped to zero when `to` is earlier.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use chrono::{TimeZone, Utc};
/// use ridepool_core::time::saturating_elapsed;
///
/// let start = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2025, 1, 1, 8, 15, 0).unwrap();
/// assert_eq!(saturating_elapsed(start, end), Duration::from_secs(900));
/// assert_eq!(saturating_elapsed(end, start), Duration::ZERO);
/// ```
#[must_use]
pub fn saturating_elapsed(from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
    to.signed_duration_since(from)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Whole seconds elapsed from `from` to `to`, clamped to zero.
#[must_use]
pub fn elapsed_secs(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    saturating_elapsed(from, to).as_secs()
}

/// `instant` advanced by `duration`, saturating at the latest representable
/// instant.
#[must_use]
pub fn advance(instant: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(duration)
        .ok()
        .and_then(|delta| instant.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// `instant` moved back by `duration`, saturating at the earliest
/// representable instant.
#[must_use]
pub fn rewind(instant: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(duration)
        .ok()
        .and_then(|delta| instant.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    fn elapsed_secs_truncates_sub_second_parts() {
        let start = Utc
            .with_ymd_and_hms(2025, 1, 1, 8, 0, 0)
            .single()
            .expect("valid instant");
        let end = start + Duration::from_millis(1_500);
        assert_eq!(elapsed_secs(start, end), 1);
    }

    #[rstest]
    fn advance_saturates() {
        assert_eq!(
            advance(DateTime::<Utc>::MAX_UTC, Duration::from_secs(1)),
            DateTime::<Utc>::MAX_UTC
        );
        assert_eq!(
            rewind(DateTime::<Utc>::MIN_UTC, Duration::from_secs(1)),
            DateTime::<Utc>::MIN_UTC
        );
    }
}
