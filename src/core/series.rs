mod aggregate;
mod gaps;

use std::collections::BTreeMap;

use chrono::{DateTime, DurationRound, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};

pub use self::{
    aggregate::{MonthlyAggregate, MonthlyMeans},
    gaps::GapReport,
};
use crate::{
    core::point::{PricePoint, RawPricePoint},
    prelude::*,
};

/// Calendar unit a series is unique by.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Resolution {
    Hourly,
    Daily,
}

impl Resolution {
    #[must_use]
    pub const fn time_delta(self) -> TimeDelta {
        match self {
            Self::Hourly => TimeDelta::hours(1),
            Self::Daily => TimeDelta::days(1),
        }
    }

    /// Truncate an UTC timestamp to the resolution unit.
    pub fn truncate(self, timestamp: DateTime<Utc>) -> Result<DateTime<Utc>> {
        Ok(timestamp.duration_trunc(self.time_delta())?)
    }
}

/// Deduplicated, UTC-normalized, strictly ascending price series.
#[must_use]
#[derive(Clone, Debug, derive_more::Deref, derive_more::IntoIterator)]
pub struct CanonicalSeries {
    #[deref]
    #[into_iterator(owned, ref)]
    points: Vec<PricePoint>,

    resolution: Resolution,
}

impl CanonicalSeries {
    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }
}

/// Result of the normalization.
#[must_use]
pub struct Normalized {
    pub series: CanonicalSeries,

    /// Truncated keys of the discarded duplicate records.
    pub duplicates: Vec<DateTime<Utc>>,

    /// Number of records with an unparseable timestamp.
    pub n_skipped: usize,
}

/// Incremental normalizer: accepts provider records batch by batch.
///
/// The first record for a truncation key wins, later ones are discarded regardless of the price.
#[must_use]
pub struct Normalizer {
    resolution: Resolution,
    points: BTreeMap<DateTime<Utc>, PricePoint>,
    duplicates: Vec<DateTime<Utc>>,
    n_skipped: usize,
}

impl Normalizer {
    pub const fn new(resolution: Resolution) -> Self {
        Self { resolution, points: BTreeMap::new(), duplicates: Vec::new(), n_skipped: 0 }
    }

    pub fn push(&mut self, raw: RawPricePoint) -> Result {
        let Some(timestamp) = parse_timestamp(&raw.timestamp) else {
            warn!(timestamp = raw.timestamp, "skipped a record with an unparseable timestamp");
            self.n_skipped += 1;
            return Ok(());
        };
        // Truncate in UTC, never in the provider's local time:
        let key = self.resolution.truncate(timestamp)?;
        if self.points.contains_key(&key) {
            self.duplicates.push(key);
        } else {
            self.points
                .insert(key, PricePoint { timestamp, price: raw.price, breakdown: raw.breakdown });
        }
        Ok(())
    }

    pub fn extend(&mut self, batch: impl IntoIterator<Item = RawPricePoint>) -> Result {
        batch.into_iter().try_for_each(|raw| self.push(raw))
    }

    pub fn finish(self) -> Normalized {
        if !self.duplicates.is_empty() {
            debug!(n_duplicates = self.duplicates.len(), "discarded duplicate records");
        }
        Normalized {
            series: CanonicalSeries {
                points: self.points.into_values().collect(),
                resolution: self.resolution,
            },
            duplicates: self.duplicates,
            n_skipped: self.n_skipped,
        }
    }
}

/// Parse an ISO-8601 timestamp into UTC. Naive timestamps are assumed to be UTC already.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Some(timestamp.to_utc());
    }
    if let Ok(timestamp) = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(timestamp.to_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .into_iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().map(|date| date.and_time(NaiveTime::MIN))
        })
        .map(|timestamp| timestamp.and_utc())
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    use super::*;

    fn normalize(resolution: Resolution, records: &[(&str, f64)]) -> Result<Normalized> {
        let mut normalizer = Normalizer::new(resolution);
        normalizer
            .extend(records.iter().map(|(timestamp, price)| RawPricePoint::new(*timestamp, *price)))?;
        Ok(normalizer.finish())
    }

    #[test]
    fn test_parse_timestamp() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 31, 22, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-31T22:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-31T22:00:00.000Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-04-01T00:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-04-01T00:00:00+0200"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-31T22:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-31 22:00:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-31"),
            Some(Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap()),
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_first_record_wins() -> Result {
        let normalized = normalize(
            Resolution::Daily,
            &[
                ("2024-01-02T05:00:00Z", 0.5),
                ("2024-01-01T05:00:00Z", 0.2),
                ("2024-01-02T06:00:00Z", 9.9),
                ("2024-01-02T05:00:00Z", 0.1),
            ],
        )?;
        let series = &normalized.series;
        assert_eq!(series.len(), 2);
        assert_abs_diff_eq!(series[0].price, 0.2);
        assert_abs_diff_eq!(series[1].price, 0.5);
        assert_eq!(series[1].timestamp, Utc.with_ymd_and_hms(2024, 1, 2, 5, 0, 0).unwrap());
        assert_eq!(normalized.duplicates.len(), 2);
        Ok(())
    }

    #[test]
    fn test_timezone_converted_before_truncation() -> Result {
        // 00:30 in Amsterdam on January 2nd is still January 1st in UTC:
        let normalized = normalize(
            Resolution::Daily,
            &[("2024-01-01T12:00:00Z", 1.0), ("2024-01-02T00:30:00+01:00", 2.0)],
        )?;
        assert_eq!(normalized.series.len(), 1);
        assert_abs_diff_eq!(normalized.series[0].price, 1.0);
        Ok(())
    }

    #[test]
    fn test_sorted_ascending() -> Result {
        let normalized = normalize(
            Resolution::Hourly,
            &[
                ("2024-01-01T02:00:00Z", 3.0),
                ("2024-01-01T00:00:00Z", 1.0),
                ("2024-01-01T01:15:00Z", 2.0),
            ],
        )?;
        assert!(normalized.series.is_sorted_by_key(|point| point.timestamp));
        assert_eq!(normalized.series.resolution(), Resolution::Hourly);
        assert_eq!(normalized.series.len(), 3);
        Ok(())
    }

    #[test]
    fn test_unparseable_timestamp_skipped() -> Result {
        let normalized =
            normalize(Resolution::Hourly, &[("n/a", 1.0), ("2024-01-01T00:00:00Z", 2.0)])?;
        assert_eq!(normalized.series.len(), 1);
        assert_eq!(normalized.n_skipped, 1);
        Ok(())
    }
}
