use std::fmt::{Debug, Formatter};

use chrono::{DateTime, TimeDelta, Utc};

#[derive(Copy, Clone, Eq, PartialEq)]
#[must_use]
pub struct Interval {
    /// Inclusive.
    pub start: DateTime<Utc>,

    /// Exclusive.
    pub end: DateTime<Utc>,
}

impl Debug for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}

impl Interval {
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Split into consecutive windows of at most `step`.
    ///
    /// An empty interval or a non-positive step yields no windows.
    pub fn windows(self, step: TimeDelta) -> impl Iterator<Item = Self> {
        let step = (step > TimeDelta::zero()).then_some(step);
        let first = step
            .filter(|_| self.start < self.end)
            .map(|step| Self::new(self.start, (self.start + step).min(self.end)));
        std::iter::successors(first, move |previous| {
            let step = step?;
            (previous.end < self.end)
                .then(|| Self::new(previous.end, (previous.end + step).min(self.end)))
        })
    }
}
