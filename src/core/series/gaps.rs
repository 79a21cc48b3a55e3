use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Europe::Amsterdam;

use crate::{
    core::{month::Month, series::CanonicalSeries},
    prelude::*,
};

const N_EXAMPLES: usize = 10;

/// Missing and duplicate units of a canonical series. Nothing here is ever filled in.
#[must_use]
#[derive(Debug, Default)]
pub struct GapReport {
    /// Genuinely missing units per month.
    pub missing: BTreeMap<Month, usize>,

    /// First few genuinely missing units.
    pub examples: Vec<DateTime<Utc>>,

    /// Missing units next to a Europe/Amsterdam clock change.
    pub transition_missing: Vec<DateTime<Utc>>,

    /// Duplicate units next to a Europe/Amsterdam clock change.
    pub transition_duplicates: Vec<DateTime<Utc>>,

    /// Other duplicate units.
    pub duplicates: Vec<DateTime<Utc>>,
}

impl GapReport {
    /// Build the report from the series and the duplicate keys discarded by the normalizer.
    #[instrument(skip_all, fields(n_points = series.len()))]
    pub fn detect(series: &CanonicalSeries, duplicates: &[DateTime<Utc>]) -> Result<Self> {
        let resolution = series.resolution();
        let present = series
            .iter()
            .map(|point| resolution.truncate(point.timestamp))
            .collect::<Result<BTreeSet<_>>>()?;

        let mut report = Self::default();
        if let (Some(first), Some(last)) = (present.first(), present.last()) {
            let mut expected = *first;
            while expected <= *last {
                if !present.contains(&expected) {
                    if is_near_clock_change(expected) {
                        report.transition_missing.push(expected);
                    } else {
                        *report.missing.entry(Month::of(&expected)).or_default() += 1;
                        if report.examples.len() < N_EXAMPLES {
                            report.examples.push(expected);
                        }
                    }
                }
                expected += resolution.time_delta();
            }
        }
        for duplicate in duplicates {
            if is_near_clock_change(*duplicate) {
                report.transition_duplicates.push(*duplicate);
            } else {
                report.duplicates.push(*duplicate);
            }
        }
        Ok(report)
    }

    #[must_use]
    pub fn n_missing(&self) -> usize {
        self.missing.values().sum()
    }

    pub fn log(&self) {
        if self.missing.is_empty() {
            info!("no missing hours");
        } else {
            warn!(n_missing = self.n_missing(), examples = ?self.examples, "found missing hours");
            for (month, n_missing) in &self.missing {
                warn!(%month, n_missing, "missing hours");
            }
        }
        if !self.transition_missing.is_empty() || !self.transition_duplicates.is_empty() {
            info!(
                missing = ?self.transition_missing,
                duplicates = ?self.transition_duplicates,
                "expected gaps around the clock changes"
            );
        }
        if !self.duplicates.is_empty() {
            warn!(
                n_duplicates = self.duplicates.len(),
                first = ?self.duplicates.first(),
                "found duplicates"
            );
        }
    }
}

/// Whether the Amsterdam UTC offset changes within an hour of the timestamp.
fn is_near_clock_change(timestamp: DateTime<Utc>) -> bool {
    let offset_at =
        |timestamp: DateTime<Utc>| Amsterdam.offset_from_utc_datetime(&timestamp.naive_utc()).fix();
    offset_at(timestamp - TimeDelta::hours(1)) != offset_at(timestamp + TimeDelta::hours(1))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::core::{
        point::RawPricePoint,
        series::{Normalizer, Resolution},
    };

    fn hourly(start: DateTime<Utc>, n_hours: i64, skip: &[i64]) -> Result<CanonicalSeries> {
        let mut normalizer = Normalizer::new(Resolution::Hourly);
        for hour in (0..n_hours).filter(|hour| !skip.contains(hour)) {
            let timestamp = start + TimeDelta::hours(hour);
            normalizer.push(RawPricePoint::new(timestamp.to_rfc3339(), 0.1))?;
        }
        Ok(normalizer.finish().series)
    }

    #[test]
    fn test_complete_series() -> Result {
        let start = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let report = GapReport::detect(&hourly(start, 48, &[])?, &[])?;
        assert_eq!(report.n_missing(), 0);
        assert!(report.transition_missing.is_empty());
        Ok(())
    }

    #[test]
    fn test_genuine_gaps_grouped_by_month() -> Result {
        let start = Utc.with_ymd_and_hms(2024, 1, 31, 20, 0, 0).unwrap();
        let report = GapReport::detect(&hourly(start, 10, &[1, 2, 6])?, &[])?;
        assert_eq!(report.n_missing(), 3);
        assert_eq!(report.missing[&Month::from_str("2024-01")?], 2);
        assert_eq!(report.missing[&Month::from_str("2024-02")?], 1);
        assert_eq!(report.examples.len(), 3);
        Ok(())
    }

    #[test]
    fn test_clock_change_reported_separately() -> Result {
        // The clocks went forward on 2024-03-31 at 01:00 UTC:
        let start = Utc.with_ymd_and_hms(2024, 3, 30, 20, 0, 0).unwrap();
        let transition = Utc.with_ymd_and_hms(2024, 3, 31, 1, 0, 0).unwrap();
        let series = hourly(start, 12, &[5])?;
        let report = GapReport::detect(&series, &[transition])?;
        assert_eq!(report.n_missing(), 0);
        assert_eq!(report.transition_missing, [transition]);
        assert_eq!(report.transition_duplicates, [transition]);
        assert!(report.duplicates.is_empty());
        Ok(())
    }

    #[test]
    fn test_is_near_clock_change() {
        assert!(is_near_clock_change(Utc.with_ymd_and_hms(2024, 10, 27, 1, 0, 0).unwrap()));
        assert!(!is_near_clock_change(Utc.with_ymd_and_hms(2024, 10, 26, 1, 0, 0).unwrap()));
    }
}
