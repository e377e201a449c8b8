//! Signing time and freshness window types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Signing time in epoch milliseconds.
///
/// Only instants strictly after 2020-01-01T00:00:00Z are representable, which
/// rejects zeroed clocks and payloads carrying seconds instead of milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u64")]
pub struct Timestamp(u64);

impl Timestamp {
    /// 2020-01-01T00:00:00Z in epoch milliseconds. Timestamps must be greater.
    pub const BASELINE_MILLIS: u64 = 1_577_836_800_000;

    /// Create a timestamp from epoch milliseconds.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidTimestamp`] if `millis` is not after the baseline.
    ///
    /// # Examples
    ///
    /// ```
    /// use appsign_core::Timestamp;
    ///
    /// assert!(Timestamp::from_millis(1_700_000_000_000).is_ok());
    /// assert!(Timestamp::from_millis(1_577_836_800_000).is_err());
    /// ```
    pub fn from_millis(millis: i64) -> CoreResult<Self> {
        match u64::try_from(millis) {
            Ok(ms) if ms > Self::BASELINE_MILLIS => Ok(Self(ms)),
            _ => Err(CoreError::InvalidTimestamp(millis)),
        }
    }

    /// The current wall-clock time.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidTimestamp`] if the system clock is set before 2020.
    pub fn now() -> CoreResult<Self> {
        Self::from_datetime(Utc::now())
    }

    /// Convert a UTC date-time.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidTimestamp`] if `at` is not after the baseline.
    pub fn from_datetime(at: DateTime<Utc>) -> CoreResult<Self> {
        Self::from_millis(at.timestamp_millis())
    }

    /// Epoch milliseconds.
    #[must_use]
    pub fn as_millis(self) -> u64 {
        self.0
    }

    /// Milliseconds elapsed from `earlier` to `self`, or `None` if `earlier` is later.
    #[must_use]
    pub fn millis_since(self, earlier: Self) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }
}

impl TryFrom<i64> for Timestamp {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_millis(value)
    }
}

impl From<Timestamp> for u64 {
    fn from(value: Timestamp) -> Self {
        value.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maximum accepted age of a signature, in milliseconds.
///
/// A request signed at `t` is fresh at `now` when `t <= now <= t + ttl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u64")]
pub struct TimeToLive(u64);

impl TimeToLive {
    /// Default window of 30 seconds.
    pub const DEFAULT: Self = Self(30_000);

    /// Create a TTL from milliseconds.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Create a TTL from whole seconds.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    /// Create a TTL from a signed millisecond count.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidTimeToLive`] if `millis` is negative.
    pub fn try_from_millis(millis: i64) -> CoreResult<Self> {
        u64::try_from(millis)
            .map(Self)
            .map_err(|_| CoreError::InvalidTimeToLive(millis))
    }

    /// The window in milliseconds.
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }
}

impl Default for TimeToLive {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for TimeToLive {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::try_from_millis(value)
    }
}

impl From<TimeToLive> for u64 {
    fn from(value: TimeToLive) -> Self {
        value.0
    }
}
