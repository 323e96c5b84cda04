//! Time abstractions
//!
//! Three distinct notions of time, each with its own type:
//! - [`Instant`]: a point on the runtime's monotonic timeline
//! - [`Duration`]: a span, kept as whole seconds plus nanoseconds
//! - [`TimeOfDay`]: a calendar timestamp, convertible to epoch seconds
//!
//! Nothing in this module performs I/O or reads a clock.

use core::cmp::Ordering;
use core::ops::{Add, Sub};
use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: u64 = 1_000_000_000;
const NANOS_PER_MICRO: u64 = 1_000;
const NANOS_PER_MILLI: u64 = 1_000_000;

/// First calendar year representable as a [`TimeOfDay`]
pub const EPOCH_BASE_YEAR: u16 = 1980;

/// Seconds from 1970-01-01T00:00:00 to the start of [`EPOCH_BASE_YEAR`]
///
/// Recorded timestamps depend on this value; it must never change.
pub const EPOCH_OFFSET_SECS: u64 = 315_532_800;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 3_600;
const SECS_PER_DAY: u64 = 86_400;
const DAYS_PER_FOUR_YEARS: u64 = 1_461;

/// Days elapsed before the first day of each month
const CUMULATIVE_DAYS: [[u64; 12]; 2] = [
    [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334],
    [0, 31, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335],
];

/// Days elapsed before year `n` of a four-year block whose first year is leap
const BLOCK_YEAR_DAYS: [u64; 4] = [0, 366, 731, 1_096];

const MONTH_DAYS: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// A point in time
///
/// Nanoseconds since the runtime's timeline started. In simulation the
/// timeline is virtual; on hardware it is derived from the tick counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Instant {
    /// Nanoseconds since some arbitrary epoch
    nanos: u64,
}

impl Instant {
    /// The start of the timeline
    pub const ZERO: Instant = Instant { nanos: 0 };

    /// Creates an instant from nanoseconds
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    /// Returns nanoseconds since epoch
    pub const fn as_nanos(&self) -> u64 {
        self.nanos
    }

    /// Returns the duration since another instant, zero if `earlier` is later
    pub fn duration_since(&self, earlier: Instant) -> Duration {
        Duration::from_nanos(self.nanos.saturating_sub(earlier.nanos))
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, duration: Duration) -> Self::Output {
        Instant::from_nanos(self.nanos.saturating_add(duration.as_nanos()))
    }
}

impl Sub<Duration> for Instant {
    type Output = Instant;

    fn sub(self, duration: Duration) -> Self::Output {
        Instant::from_nanos(self.nanos.saturating_sub(duration.as_nanos()))
    }
}

/// A duration of time
///
/// Whole seconds plus a sub-second nanosecond part. Values built with
/// [`Duration::new`] keep whatever parts they were given; every other
/// constructor and every arithmetic result is normalized
/// (`nanos < 1_000_000_000`).
///
/// Ordering is lexicographic on `(secs, nanos)`, so compare normalized
/// values.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Duration {
    secs: u64,
    nanos: u64,
}

impl Duration {
    pub const ZERO: Duration = Duration { secs: 0, nanos: 0 };

    /// Creates a duration from raw parts, without normalizing
    pub const fn new(secs: u64, nanos: u64) -> Self {
        Self { secs, nanos }
    }

    /// Creates a duration from nanoseconds
    pub const fn from_nanos(nanos: u64) -> Self {
        Self {
            secs: nanos / NANOS_PER_SEC,
            nanos: nanos % NANOS_PER_SEC,
        }
    }

    /// Creates a duration from microseconds
    pub const fn from_micros(micros: u64) -> Self {
        Self {
            secs: micros / 1_000_000,
            nanos: (micros % 1_000_000) * NANOS_PER_MICRO,
        }
    }

    /// Creates a duration from milliseconds
    pub const fn from_millis(millis: u64) -> Self {
        Self {
            secs: millis / 1_000,
            nanos: (millis % 1_000) * NANOS_PER_MILLI,
        }
    }

    /// Creates a duration from seconds
    pub const fn from_secs(secs: u64) -> Self {
        Self { secs, nanos: 0 }
    }

    /// Returns the whole-seconds part
    pub const fn secs(&self) -> u64 {
        self.secs
    }

    /// Returns the sub-second part
    pub const fn subsec_nanos(&self) -> u64 {
        self.nanos
    }

    /// Returns true if `nanos < 1_000_000_000`
    pub const fn is_normalized(&self) -> bool {
        self.nanos < NANOS_PER_SEC
    }

    /// Returns true for a zero-length duration
    pub const fn is_zero(&self) -> bool {
        self.secs == 0 && self.nanos == 0
    }

    /// Carries whole seconds out of the nanosecond part
    ///
    /// Saturates at `u64::MAX` seconds.
    pub const fn normalize(self) -> Self {
        Self {
            secs: self.secs.saturating_add(self.nanos / NANOS_PER_SEC),
            nanos: self.nanos % NANOS_PER_SEC,
        }
    }

    /// Returns the total length in nanoseconds, saturating
    pub const fn as_nanos(&self) -> u64 {
        self.secs
            .saturating_mul(NANOS_PER_SEC)
            .saturating_add(self.nanos)
    }

    /// Returns the duration in microseconds
    pub const fn as_micros(&self) -> u64 {
        self.as_nanos() / NANOS_PER_MICRO
    }

    /// Returns the duration in milliseconds
    pub const fn as_millis(&self) -> u64 {
        self.as_nanos() / NANOS_PER_MILLI
    }

    /// Adds microseconds, returning a normalized duration
    pub fn add_micros(self, micros: u64) -> Self {
        self + Duration::from_micros(micros)
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, other: Duration) -> Self::Output {
        let a = self.normalize();
        let b = other.normalize();
        Duration::new(a.secs.saturating_add(b.secs), a.nanos + b.nanos).normalize()
    }
}

impl Sub for Duration {
    type Output = Duration;

    fn sub(self, other: Duration) -> Self::Output {
        let a = self.normalize();
        let b = other.normalize();
        if a <= b {
            return Duration::ZERO;
        }
        if a.nanos >= b.nanos {
            Duration::new(a.secs - b.secs, a.nanos - b.nanos)
        } else {
            Duration::new(a.secs - b.secs - 1, a.nanos + NANOS_PER_SEC - b.nanos)
        }
    }
}

impl From<core::time::Duration> for Duration {
    fn from(d: core::time::Duration) -> Self {
        Duration::new(d.as_secs(), d.subsec_nanos() as u64)
    }
}

impl From<Duration> for core::time::Duration {
    fn from(d: Duration) -> Self {
        let d = d.normalize();
        core::time::Duration::new(d.secs, d.nanos as u32)
    }
}

/// Normalizes a duration so that its sub-second part is below one second
pub fn normalize_duration(d: Duration) -> Duration {
    d.normalize()
}

/// Compares two durations lexicographically on `(secs, nanos)`
pub fn compare_duration(a: &Duration, b: &Duration) -> Ordering {
    a.cmp(b)
}

/// Adds microseconds to a duration
pub fn add_duration(d: Duration, micros: u64) -> Duration {
    d.add_micros(micros)
}

/// Leap-year rule of the recorded calendar: every fourth year
///
/// There is no century exception. The rule is exact from 1901 to 2099,
/// which covers every year from [`EPOCH_BASE_YEAR`] a mission will see.
pub const fn is_leap_year(year: u16) -> bool {
    year % 4 == 0
}

/// Days in `month` (1-12) of `year`, or zero for an invalid month
pub fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        2 if is_leap_year(year) => 29,
        1..=12 => MONTH_DAYS[(month - 1) as usize],
        _ => 0,
    }
}

/// A calendar time-of-day
///
/// The sub-second part is `nanosecond`, one unit being one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeOfDay {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub nanosecond: u32,
}

impl TimeOfDay {
    /// Creates a time-of-day at a whole second
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            nanosecond: 0,
        }
    }

    /// Builder: sets the sub-second part
    pub fn with_nanosecond(mut self, nanosecond: u32) -> Self {
        self.nanosecond = nanosecond;
        self
    }

    /// Checks every field against the calendar
    pub fn is_valid(&self) -> bool {
        (self.nanosecond as u64) < NANOS_PER_SEC
            && self.second < 60
            && self.minute < 60
            && self.hour < 24
            && (1..=12).contains(&self.month)
            && self.year >= EPOCH_BASE_YEAR
            && self.day != 0
            && self.day <= days_in_month(self.year, self.month)
    }

    /// Whole seconds since 1970-01-01T00:00:00, or `None` if invalid
    ///
    /// Days since [`EPOCH_BASE_YEAR`] are accumulated from four-year
    /// blocks, the position inside the block and the month table; the
    /// fixed [`EPOCH_OFFSET_SECS`] is then added. The sub-second part is
    /// not included.
    pub fn to_epoch_seconds(&self) -> Option<u64> {
        if !self.is_valid() {
            return None;
        }

        let years = (self.year - EPOCH_BASE_YEAR) as u64;
        let leap = is_leap_year(self.year) as usize;

        let mut days = (years / 4) * DAYS_PER_FOUR_YEARS;
        days += BLOCK_YEAR_DAYS[(years % 4) as usize];
        days += CUMULATIVE_DAYS[leap][(self.month - 1) as usize];
        days += (self.day - 1) as u64;

        let secs = days * SECS_PER_DAY
            + self.hour as u64 * SECS_PER_HOUR
            + self.minute as u64 * SECS_PER_MINUTE
            + self.second as u64;

        Some(secs + EPOCH_OFFSET_SECS)
    }
}

/// Validates an optional time-of-day; an absent value is invalid
pub fn tod_validate(tod: Option<&TimeOfDay>) -> bool {
    tod.map(TimeOfDay::is_valid).unwrap_or(false)
}

/// Converts a time-of-day to epoch seconds; `None` for invalid input
pub fn tod_to_epoch_seconds(tod: &TimeOfDay) -> Option<u64> {
    tod.to_epoch_seconds()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_creation() {
        let d1 = Duration::from_secs(1);
        let d2 = Duration::from_millis(1000);
        let d3 = Duration::from_micros(1_000_000);
        let d4 = Duration::from_nanos(1_000_000_000);

        assert_eq!(d1, d2);
        assert_eq!(d2, d3);
        assert_eq!(d3, d4);
    }

    #[test]
    fn test_duration_conversion() {
        let d = Duration::from_millis(1500);
        assert_eq!(d.secs(), 1);
        assert_eq!(d.subsec_nanos(), 500_000_000);
        assert_eq!(d.as_millis(), 1500);
        assert_eq!(d.as_micros(), 1_500_000);
        assert_eq!(d.as_nanos(), 1_500_000_000);
    }

    #[test]
    fn test_normalize_carries_into_seconds() {
        let d = normalize_duration(Duration::new(0, 2_500_000_000));
        assert_eq!(d, Duration::new(2, 500_000_000));
        assert!(d.is_normalized());
    }

    #[test]
    fn test_normalize_extremes() {
        let d = Duration::new(7, u64::MAX).normalize();
        assert!(d.is_normalized());
        assert_eq!(d.secs(), 7 + u64::MAX / 1_000_000_000);

        let d = Duration::new(u64::MAX, 3_000_000_000).normalize();
        assert_eq!(d.secs(), u64::MAX);
        assert!(d.is_normalized());
    }

    #[test]
    fn test_compare_is_lexicographic() {
        let a = Duration::new(1, 999_999_999);
        let b = Duration::new(2, 0);
        assert_eq!(compare_duration(&a, &b), Ordering::Less);
        assert_eq!(compare_duration(&b, &a), Ordering::Greater);
        assert_eq!(compare_duration(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_add_micros() {
        let d = add_duration(Duration::new(1, 999_999_000), 2);
        assert_eq!(d, Duration::new(2, 1_000));

        let d = Duration::ZERO.add_micros(3_250_000);
        assert_eq!(d, Duration::new(3, 250_000_000));
    }

    #[test]
    fn test_duration_arithmetic() {
        let d1 = Duration::from_millis(500);
        let d2 = Duration::from_millis(700);

        assert_eq!(d1 + d2, Duration::from_millis(1200));
        assert_eq!(d2 - d1, Duration::from_millis(200));
        assert_eq!(d1 - d2, Duration::ZERO);
        assert_eq!(Duration::from_secs(2) - Duration::from_millis(1), Duration::new(1, 999_000_000));
    }

    #[test]
    fn test_std_duration_roundtrip() {
        let d = Duration::new(3, 1_250_000_000);
        let std: core::time::Duration = d.into();
        assert_eq!(std, core::time::Duration::new(4, 250_000_000));
        assert_eq!(Duration::from(std), Duration::new(4, 250_000_000));
    }

    #[test]
    fn test_instant_arithmetic() {
        let i = Instant::from_nanos(1000);
        let d = Duration::from_nanos(500);

        assert_eq!(i + d, Instant::from_nanos(1500));
        assert_eq!(i - d, Instant::from_nanos(500));
        assert_eq!((i + d).duration_since(i), d);
        assert_eq!(i.duration_since(i + d), Duration::ZERO);
    }

    #[test]
    fn test_leap_rule_has_no_century_exception() {
        assert!(is_leap_year(1980));
        assert!(is_leap_year(2000));
        assert!(is_leap_year(2100));
        assert!(!is_leap_year(2023));
        assert_eq!(days_in_month(2100, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2023, 13), 0);
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let good = TimeOfDay::new(2024, 2, 29, 23, 59, 59).with_nanosecond(999_999_999);
        assert!(tod_validate(Some(&good)));
        assert!(!tod_validate(None));

        let cases = [
            TimeOfDay { nanosecond: 1_000_000_000, ..good },
            TimeOfDay { second: 60, ..good },
            TimeOfDay { minute: 60, ..good },
            TimeOfDay { hour: 24, ..good },
            TimeOfDay { month: 0, ..good },
            TimeOfDay { month: 13, ..good },
            TimeOfDay { year: 1979, ..good },
            TimeOfDay { day: 0, ..good },
            TimeOfDay { year: 2023, ..good },
            TimeOfDay::new(2023, 2, 30, 0, 0, 0),
            TimeOfDay::new(2023, 4, 31, 0, 0, 0),
        ];
        for tod in cases.iter() {
            assert!(!tod.is_valid(), "{:?} should be invalid", tod);
            assert_eq!(tod_to_epoch_seconds(tod), None);
        }
    }

    #[test]
    fn test_epoch_reference_values() {
        let cases = [
            (TimeOfDay::new(1980, 1, 1, 0, 0, 0), 315_532_800),
            (TimeOfDay::new(1983, 12, 31, 23, 59, 59), 441_763_199),
            (TimeOfDay::new(1984, 1, 1, 0, 0, 0), 441_763_200),
            (TimeOfDay::new(2000, 1, 1, 0, 0, 0), 946_684_800),
            (TimeOfDay::new(2024, 2, 29, 12, 0, 0), 1_709_208_000),
            (TimeOfDay::new(2038, 1, 19, 3, 14, 7), 2_147_483_647),
            (TimeOfDay::new(2099, 12, 31, 23, 59, 59), 4_102_444_799),
        ];
        for (tod, expected) in cases.iter() {
            assert_eq!(tod.to_epoch_seconds(), Some(*expected), "{:?}", tod);
        }
    }

    #[test]
    fn test_years_before_1988_are_accepted() {
        let early = TimeOfDay::new(1987, 12, 31, 23, 59, 59);
        assert!(tod_validate(Some(&early)));
        assert_eq!(tod_to_epoch_seconds(&early), Some(567_993_599));

        let later = TimeOfDay::new(1988, 1, 1, 0, 0, 0);
        assert_eq!(tod_to_epoch_seconds(&later), Some(567_993_600));

        assert!(!tod_validate(Some(&TimeOfDay::new(1979, 12, 31, 23, 59, 59))));
    }

    #[test]
    fn test_subsecond_does_not_change_epoch_seconds() {
        let tod = TimeOfDay::new(2010, 6, 15, 8, 30, 0);
        assert_eq!(
            tod.to_epoch_seconds(),
            tod.with_nanosecond(500_000_000).to_epoch_seconds()
        );
    }

    fn next_second(tod: TimeOfDay) -> TimeOfDay {
        let mut t = tod;
        t.second += 1;
        if t.second == 60 {
            t.second = 0;
            t.minute += 1;
        }
        if t.minute == 60 {
            t.minute = 0;
            t.hour += 1;
        }
        if t.hour == 24 {
            t.hour = 0;
            t.day += 1;
        }
        if t.day > days_in_month(t.year, t.month) {
            t.day = 1;
            t.month += 1;
        }
        if t.month == 13 {
            t.month = 1;
            t.year += 1;
        }
        t
    }

    #[test]
    fn test_epoch_seconds_step_by_one_across_boundaries() {
        let starts = [
            TimeOfDay::new(1980, 2, 28, 23, 59, 58),
            TimeOfDay::new(1980, 12, 31, 23, 59, 58),
            TimeOfDay::new(1999, 12, 31, 23, 59, 58),
            TimeOfDay::new(2023, 2, 28, 23, 59, 58),
            TimeOfDay::new(2024, 2, 29, 23, 59, 58),
        ];
        for start in starts.iter() {
            let mut tod = *start;
            let mut prev = tod.to_epoch_seconds().unwrap();
            for _ in 0..4 {
                tod = next_second(tod);
                let secs = tod.to_epoch_seconds().unwrap();
                assert_eq!(secs, prev + 1, "{:?}", tod);
                prev = secs;
            }
        }
    }

    #[test]
    fn test_epoch_seconds_monotonic_over_a_leap_cycle() {
        let mut tod = TimeOfDay::new(1987, 12, 31, 0, 0, 0);
        let mut prev = tod.to_epoch_seconds().unwrap();
        for _ in 0..(4 * 366) {
            let end_of_day = TimeOfDay {
                hour: 23,
                minute: 59,
                second: 59,
                ..tod
            };
            assert_eq!(end_of_day.to_epoch_seconds().unwrap(), prev + 86_399);

            tod = next_second(end_of_day);
            let secs = tod.to_epoch_seconds().unwrap();
            assert_eq!(secs, prev + 86_400, "{:?}", tod);
            prev = secs;
        }
    }

    #[test]
    fn test_time_of_day_serde() {
        let tod = TimeOfDay::new(2030, 7, 4, 12, 0, 1);
        let json = serde_json::to_string(&tod).unwrap();
        let back: TimeOfDay = serde_json::from_str(&json).unwrap();
        assert_eq!(tod, back);
    }
}
