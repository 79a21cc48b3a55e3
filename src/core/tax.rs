use std::{
    collections::{BTreeMap, btree_map::Entry},
    fmt::{Display, Formatter},
};

use serde::Serialize;

use crate::{
    core::{month::Month, series::Resolution},
    error::PipelineError,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Commodity {
    Electricity,
    Gas,
}

impl Commodity {
    /// Electricity spot prices are hourly, gas prices are daily.
    #[must_use]
    pub const fn resolution(self) -> Resolution {
        match self {
            Self::Electricity => Resolution::Hourly,
            Self::Gas => Resolution::Daily,
        }
    }
}

impl Display for Commodity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Electricity => write!(f, "electricity"),
            Self::Gas => write!(f, "gas"),
        }
    }
}

/// Official consumer tariff of one commodity, including VAT.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Tariff {
    pub base_rate: f64,
    pub energy_tax: f64,
    pub total: f64,
}

impl Tariff {
    #[must_use]
    pub fn new(base_rate: f64, energy_tax: f64) -> Self {
        Self { base_rate, energy_tax, total: base_rate + energy_tax }
    }
}

/// Official monthly rates as published by the statistics office.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaxRate {
    pub period: Month,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub electricity: Option<Tariff>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<Tariff>,
}

impl TaxRate {
    #[must_use]
    pub const fn tariff(&self, commodity: Commodity) -> Option<&Tariff> {
        match commodity {
            Commodity::Electricity => self.electricity.as_ref(),
            Commodity::Gas => self.gas.as_ref(),
        }
    }
}

/// Tax rates keyed by month, at most one per month.
#[must_use]
#[derive(Clone, Debug, Default)]
pub struct TaxTable(BTreeMap<Month, TaxRate>);

impl TaxTable {
    /// Build the table, refusing duplicate months.
    pub fn try_from_rates(rates: impl IntoIterator<Item = TaxRate>) -> Result<Self, PipelineError> {
        let mut table = BTreeMap::new();
        for rate in rates {
            match table.entry(rate.period) {
                Entry::Vacant(entry) => {
                    entry.insert(rate);
                }
                Entry::Occupied(entry) => {
                    return Err(PipelineError::DuplicateTaxRate(*entry.key()));
                }
            }
        }
        Ok(Self(table))
    }

    #[must_use]
    pub fn get(&self, month: Month) -> Option<&TaxRate> {
        self.0.get(&month)
    }

    /// Rates in ascending month order.
    pub fn rates(&self) -> impl Iterator<Item = &TaxRate> {
        self.0.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::prelude::*;

    fn rate(period: &str, electricity_tax: f64) -> Result<TaxRate> {
        Ok(TaxRate {
            period: Month::from_str(period)?,
            electricity: Some(Tariff::new(0.25, electricity_tax)),
            gas: None,
        })
    }

    #[test]
    fn test_tariff_total() {
        assert_abs_diff_eq!(Tariff::new(0.25, 0.10154).total, 0.35154);
    }

    #[test]
    fn test_table_sorted_by_month() -> Result {
        let table = TaxTable::try_from_rates([rate("2025-02", 0.1)?, rate("2025-01", 0.2)?])?;
        assert_eq!(table.len(), 2);
        let periods: Vec<_> = table.rates().map(|rate| rate.period.to_string()).collect();
        assert_eq!(periods, ["2025-01", "2025-02"]);
        Ok(())
    }

    #[test]
    fn test_duplicate_month_is_detected() -> Result {
        let result = TaxTable::try_from_rates([rate("2025-01", 0.1)?, rate("2025-01", 0.2)?]);
        assert!(matches!(
            result,
            Err(PipelineError::DuplicateTaxRate(month)) if month.to_string() == "2025-01"
        ));
        Ok(())
    }

    #[test]
    fn test_tariff_selector() -> Result {
        let rate = rate("2025-01", 0.1)?;
        assert!(rate.tariff(Commodity::Electricity).is_some());
        assert!(rate.tariff(Commodity::Gas).is_none());
        Ok(())
    }
}
