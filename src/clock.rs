//! Clock

use std::fmt::Debug;

use jiff::Zoned;

/// Source of "now" for expiry checks. The returned time zone is the server-local zone.
pub trait Clock: Debug + Send + Sync {
    /// The current instant.
    fn now(&self) -> Zoned;
}

/// The system clock in the system time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Zoned {
        Zoned::now()
    }
}

/// A clock stopped at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedClock(Zoned);

impl FixedClock {
    /// Stop the clock at `now`.
    pub fn new(now: Zoned) -> Self {
        Self(now)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Zoned {
        self.0.clone()
    }
}
