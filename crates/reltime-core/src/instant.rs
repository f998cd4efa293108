//! Millisecond-resolution points in time.
//!
//! [`Instant`] is the only time representation the formatter accepts. Raw
//! host values (text, numbers, `SystemTime`, chrono datetimes) are
//! normalized here; anything that cannot be normalized is an
//! [`FormatError::Argument`].

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use web_time::{SystemTime, UNIX_EPOCH};

use crate::error::FormatError;

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant(i64);

impl Instant {
    /// 1970-01-01T00:00:00Z.
    pub const EPOCH: Instant = Instant(0);

    #[must_use]
    pub const fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    /// Normalize a fractional millisecond count (truncated toward zero).
    pub fn from_millis_f64(ms: f64) -> Result<Self, FormatError> {
        if !ms.is_finite() {
            return Err(FormatError::Argument(format!("non-finite timestamp: {ms}")));
        }
        let ms = ms.trunc();
        if ms < i64::MIN as f64 || ms > i64::MAX as f64 {
            return Err(FormatError::Argument(format!("timestamp out of range: {ms}")));
        }
        Ok(Self(ms as i64))
    }

    /// Normalize a fractional second count.
    pub fn from_secs_f64(secs: f64) -> Result<Self, FormatError> {
        Self::from_millis_f64(secs * 1000.0)
    }

    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Signed seconds from `earlier` to `self`; negative when `earlier` is later.
    #[must_use]
    pub fn seconds_since(self, earlier: Instant) -> f64 {
        (i128::from(self.0) - i128::from(earlier.0)) as f64 / 1000.0
    }

    #[must_use]
    pub fn saturating_add(self, d: Duration) -> Self {
        let ms = i64::try_from(d.as_millis()).unwrap_or(i64::MAX);
        Self(self.0.saturating_add(ms))
    }

    #[must_use]
    pub fn saturating_sub(self, d: Duration) -> Self {
        let ms = i64::try_from(d.as_millis()).unwrap_or(i64::MAX);
        Self(self.0.saturating_sub(ms))
    }

    /// Time left until `later`, zero if `later` has passed.
    #[must_use]
    pub fn until(self, later: Instant) -> Duration {
        let ms = later.0.saturating_sub(self.0);
        Duration::from_millis(u64::try_from(ms).unwrap_or(0))
    }

    /// UTC datetime, `None` outside chrono's representable range.
    #[must_use]
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }

    /// Machine-readable RFC 3339 text (millisecond precision, `Z` suffix).
    ///
    /// Falls back to the raw millisecond count outside chrono's range.
    #[must_use]
    pub fn to_rfc3339(self) -> String {
        match self.to_datetime() {
            Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            None => self.0.to_string(),
        }
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl From<SystemTime> for Instant {
    fn from(t: SystemTime) -> Self {
        let ms = match t.duration_since(UNIX_EPOCH) {
            Ok(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
            Err(e) => i64::try_from(e.duration().as_millis())
                .map(|ms| -ms)
                .unwrap_or(i64::MIN),
        };
        Self(ms)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Instant {
    fn from(dt: DateTime<Tz>) -> Self {
        Self(dt.timestamp_millis())
    }
}

impl FromStr for Instant {
    type Err = FormatError;

    /// Accepts an integer or fractional millisecond count, RFC 3339 text,
    /// `YYYY-MM-DDTHH:MM:SS` / `YYYY-MM-DD HH:MM:SS` (read as UTC), or a
    /// bare `YYYY-MM-DD` date (UTC midnight).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(FormatError::Argument("empty timestamp".into()));
        }
        if let Ok(ms) = s.parse::<i64>() {
            return Ok(Self(ms));
        }
        if let Ok(ms) = s.parse::<f64>() {
            return Self::from_millis_f64(ms);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.into());
        }
        for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, pattern) {
                return Ok(naive.and_utc().into());
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            && let Some(naive) = date.and_hms_opt(0, 0, 0)
        {
            return Ok(naive.and_utc().into());
        }
        Err(FormatError::Argument(format!("unrecognized timestamp: {s:?}")))
    }
}
