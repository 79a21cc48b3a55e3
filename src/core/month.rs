use std::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::prelude::*;

/// Locale-independent month abbreviations used by the comparison labels.
const ABBREVIATIONS: [&str; 12] =
    ["jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec"];

/// Calendar month, the merge and join key of every monthly dataset.
///
/// Displayed and parsed as `YYYY-MM`. Ordering is chronological.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct Month(NaiveDate);

impl Month {
    #[must_use]
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// Month of the timestamp in its own timezone.
    ///
    /// Convert to UTC first to get the UTC month.
    pub fn of<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> Self {
        Self(timestamp.date_naive().with_day(1).unwrap_or_else(|| timestamp.date_naive()))
    }

    #[must_use]
    pub fn year(self) -> i32 {
        self.0.year()
    }

    #[must_use]
    pub fn month(self) -> u32 {
        self.0.month()
    }

    /// First instant of the month in UTC.
    #[must_use]
    pub fn start(self) -> DateTime<Utc> {
        self.0.and_time(NaiveTime::MIN).and_utc()
    }

    /// Comparison label, for example `jan-21`.
    #[must_use]
    pub fn label(self) -> String {
        format!("{}-{:02}", ABBREVIATIONS[self.0.month0() as usize], self.year().rem_euclid(100))
    }

    /// Parse a comparison label such as `jan-21`. Two-digit years are in the 2000s.
    pub fn from_label(label: &str) -> Result<Self> {
        let (abbreviation, year) =
            label.split_once('-').with_context(|| format!("malformed month label `{label}`"))?;
        let month = ABBREVIATIONS
            .iter()
            .position(|known| *known == abbreviation)
            .with_context(|| format!("unknown month abbreviation in `{label}`"))?;
        ensure!(
            year.len() == 2 && year.bytes().all(|byte| byte.is_ascii_digit()),
            "malformed year in `{label}`",
        );
        let year = 2000 + year.parse::<i32>()?;
        Self::new(year, u32::try_from(month)? + 1)
            .with_context(|| format!("invalid month label `{label}`"))
    }
}

impl FromStr for Month {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (year, month) =
            s.trim().split_once('-').with_context(|| format!("expected `YYYY-MM`, got `{s}`"))?;
        ensure!(
            year.len() == 4
                && month.len() == 2
                && year.bytes().chain(month.bytes()).all(|byte| byte.is_ascii_digit()),
            "expected `YYYY-MM`, got `{s}`",
        );
        let year = year.parse().with_context(|| format!("invalid year in `{s}`"))?;
        let month = month.parse().with_context(|| format!("invalid month in `{s}`"))?;
        Self::new(year, month).with_context(|| format!("invalid month `{s}`"))
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl Debug for Month {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}
