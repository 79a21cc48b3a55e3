use std::collections::BTreeMap;

use average::Mean;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{core::month::Month, fmt::serialize_price};

/// Arithmetic mean price of a calendar month.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub month: Month,

    #[serde(serialize_with = "serialize_price")]
    pub mean_price: f64,
}

impl<T> MonthlyMeans for T where T: ?Sized {}

pub trait MonthlyMeans {
    /// Group the values by the UTC month and average each group without weighting.
    ///
    /// Months without values do not appear in the output.
    #[must_use]
    fn monthly_means(self) -> Vec<MonthlyAggregate>
    where
        Self: Sized + IntoIterator<Item = (DateTime<Utc>, f64)>,
    {
        let mut groups: BTreeMap<Month, Vec<f64>> = BTreeMap::new();
        for (timestamp, value) in self {
            groups.entry(Month::of(&timestamp)).or_default().push(value);
        }
        groups
            .into_iter()
            .map(|(month, values)| {
                let estimate: Mean = values.into_iter().collect();
                MonthlyAggregate { month, mean_price: estimate.mean() }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use approx::assert_abs_diff_eq;
    use chrono::{TimeDelta, TimeZone};

    use super::*;
    use crate::prelude::*;

    #[test]
    fn test_monthly_means() -> Result {
        let january = Utc.with_ymd_and_hms(2025, 1, 31, 20, 0, 0).unwrap();
        let march = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let aggregates = vec![
            (january, 0.10),
            (january + TimeDelta::hours(1), 0.20),
            (january + TimeDelta::hours(2), 0.60),
            (march, -0.05),
        ]
        .monthly_means();

        assert_eq!(aggregates.len(), 2, "February has no data and must not appear");
        assert_eq!(aggregates[0].month, Month::from_str("2025-01")?);
        assert_abs_diff_eq!(aggregates[0].mean_price, 0.30);
        assert_eq!(aggregates[1].month, Month::from_str("2025-03")?);
        assert_abs_diff_eq!(aggregates[1].mean_price, -0.05);
        Ok(())
    }

    #[test]
    fn test_month_boundary_is_utc() -> Result {
        // 2025-02-01T00:00 in Amsterdam is 2025-01-31T23:00 UTC:
        let timestamp = Utc.with_ymd_and_hms(2025, 1, 31, 23, 0, 0).unwrap();
        let aggregates = vec![(timestamp, 1.0)].monthly_means();
        assert_eq!(aggregates[0].month, Month::from_str("2025-01")?);
        Ok(())
    }

    #[test]
    fn test_empty() {
        assert!(Vec::<(DateTime<Utc>, f64)>::new().monthly_means().is_empty());
    }
}
