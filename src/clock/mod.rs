//! Time source shared by every ledger on the exchange

use std::cell::Cell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

///[DateTime] is a wrapper around epoch time in milliseconds. Trades are stamped at millisecond
///resolution so everything downstream, including window arithmetic, works on this type.
//The time package is kept behind the conversions below so that ledger code only deals with plain
//integer instants.
#[derive(Clone, Debug, Hash, Eq, PartialEq, PartialOrd, Copy, Ord, Deserialize, Serialize)]
pub struct DateTime(i64);

impl DateTime {
    /// Age of this instant as observed at `now`. Negative if `now` is earlier.
    pub fn age_at(&self, now: DateTime) -> Duration {
        Duration::milliseconds(now.0 - self.0)
    }

    pub fn checked_sub(&self, duration: Duration) -> Option<DateTime> {
        let millis = i64::try_from(duration.whole_milliseconds()).ok()?;
        self.0.checked_sub(millis).map(DateTime)
    }
}

impl Deref for DateTime {
    type Target = i64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<OffsetDateTime> for DateTime {
    fn from(value: OffsetDateTime) -> Self {
        DateTime((value.unix_timestamp_nanos() / 1_000_000) as i64)
    }
}

impl TryFrom<DateTime> for OffsetDateTime {
    type Error = time::error::ComponentRange;

    fn try_from(v: DateTime) -> Result<Self, Self::Error> {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(v.0) * 1_000_000)
    }
}

impl From<DateTime> for i64 {
    fn from(v: DateTime) -> Self {
        v.0
    }
}

impl From<i64> for DateTime {
    fn from(v: i64) -> Self {
        DateTime(v)
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match OffsetDateTime::try_from(*self).map(|date| date.format(&Rfc3339)) {
            Ok(Ok(formatted)) => write!(f, "{formatted}"),
            _ => write!(f, "{}ms", self.0),
        }
    }
}

/// Source of "now" for trade timestamps and window checks.
///
/// [Clock] is cheap to clone. A manual clock shares one instant between all of its clones so an
/// exchange and every ledger it owns move together when a test advances time. The shared instant
/// sits in an [Rc] so a [Clock], and anything holding one, cannot cross threads.
#[derive(Clone, Debug)]
pub enum Clock {
    System,
    Manual(Rc<Cell<DateTime>>),
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

impl Clock {
    pub fn system() -> Self {
        Clock::System
    }

    pub fn manual(start: impl Into<DateTime>) -> Self {
        Clock::Manual(Rc::new(Cell::new(start.into())))
    }

    pub fn now(&self) -> DateTime {
        match self {
            Clock::System => OffsetDateTime::now_utc().into(),
            Clock::Manual(inner) => inner.get(),
        }
    }

    /// Moves a manual clock forward. The system clock ignores this.
    pub fn advance(&self, by: Duration) {
        if let Clock::Manual(inner) = self {
            let millis = by.whole_milliseconds() as i64;
            inner.set(DateTime(*inner.get() + millis));
        }
    }

    pub fn set(&self, to: impl Into<DateTime>) {
        if let Clock::Manual(inner) = self {
            inner.set(to.into());
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, Clock::Manual(_))
    }
}
