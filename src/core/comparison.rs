use std::collections::BTreeMap;

use bon::Builder;

use crate::{
    core::{month::Month, reconcile::ReconciledRow, reference::ReferenceTable, tax::TaxTable},
    fmt::FormattedPrice,
    prelude::*,
};

pub const HEADER: [&str; 5] = ["DATE", "CBS stroom", "ANWB stroom", "CBS gas", "ANWB gas"];

/// Official and market all-in prices of one month.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ComparisonRow {
    pub month: Month,
    pub cbs_electricity: Option<f64>,
    pub anwb_electricity: Option<f64>,
    pub cbs_gas: Option<f64>,
    pub anwb_gas: Option<f64>,
}

impl ComparisonRow {
    pub const fn new(month: Month) -> Self {
        Self { month, cbs_electricity: None, anwb_electricity: None, cbs_gas: None, anwb_gas: None }
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.cbs_electricity.is_some()
            && self.anwb_electricity.is_some()
            && self.cbs_gas.is_some()
            && self.anwb_gas.is_some()
    }
}

/// Historical block followed by the live block, in chronological order.
#[must_use]
#[derive(Clone, Debug, derive_more::Deref)]
pub struct ComparisonTable(Vec<ComparisonRow>);

impl ComparisonTable {
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(HEADER)?;
        for row in &self.0 {
            writer.write_record([
                row.month.label(),
                FormattedPrice(row.cbs_electricity).to_string(),
                FormattedPrice(row.anwb_electricity).to_string(),
                FormattedPrice(row.cbs_gas).to_string(),
                FormattedPrice(row.anwb_gas).to_string(),
            ])?;
        }
        Ok(writer.into_inner()?)
    }
}

#[derive(Builder)]
pub struct ComparisonBuilder<'a> {
    reference: &'a ReferenceTable,

    /// Drop the live rows lacking any of the four prices.
    #[builder(default)]
    require_complete_row: bool,
}

impl ComparisonBuilder<'_> {
    /// Outer-join the official totals with the market totals and prepend the reference table.
    #[instrument(skip_all)]
    pub fn build(
        &self,
        tax_table: &TaxTable,
        electricity: &[ReconciledRow],
        gas: &[ReconciledRow],
    ) -> ComparisonTable {
        let mut live = BTreeMap::<Month, ComparisonRow>::new();
        for rate in tax_table.rates() {
            let row = live.entry(rate.period).or_insert_with(|| ComparisonRow::new(rate.period));
            row.cbs_electricity = rate.electricity.map(|tariff| tariff.total);
            row.cbs_gas = rate.gas.map(|tariff| tariff.total);
        }
        for market in electricity {
            live.entry(market.month)
                .or_insert_with(|| ComparisonRow::new(market.month))
                .anwb_electricity = Some(market.total_price);
        }
        for market in gas {
            live.entry(market.month).or_insert_with(|| ComparisonRow::new(market.month)).anwb_gas =
                Some(market.total_price);
        }

        let cutoff = self.reference.last_month();
        let n_joined = live.len();
        let live = live
            .into_values()
            .filter(|row| cutoff.is_none_or(|cutoff| row.month > cutoff))
            .filter(|row| !self.require_complete_row || row.is_complete())
            .collect::<Vec<_>>();
        debug!(n_joined, n_live = live.len(), cutoff = ?cutoff, "joined");

        let rows = self.reference.rows().iter().copied().chain(live).collect();
        ComparisonTable(rows)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::core::tax::{Tariff, TaxRate};

    fn month(text: &str) -> Month {
        Month::from_str(text).unwrap()
    }

    fn market(text: &str, total_price: f64) -> ReconciledRow {
        ReconciledRow {
            month: month(text),
            base_price: 0.0,
            energy_tax: 0.0,
            procurement_costs: 0.0,
            total_price,
        }
    }

    fn reference() -> Result<ReferenceTable> {
        // language=toml
        ReferenceTable::from_toml(
            r#"
            electricity = [
                { month = "nov-24", cbs = 0.25, anwb = 0.24 },
                { month = "dec-24", cbs = 0.26, anwb = 0.27 },
            ]
            gas = [
                { month = "nov-24", cbs = 1.3, anwb = 1.2 },
                { month = "dec-24", cbs = 1.35, anwb = 1.25 },
            ]
            "#,
        )
    }

    fn tax_table() -> Result<TaxTable> {
        Ok(TaxTable::try_from_rates([
            TaxRate {
                period: month("2024-12"),
                electricity: Some(Tariff::new(0.1, 0.1)),
                gas: Some(Tariff::new(1.0, 0.5)),
            },
            TaxRate {
                period: month("2025-01"),
                electricity: Some(Tariff::new(0.2, 0.1)),
                gas: Some(Tariff::new(1.0, 0.6)),
            },
            TaxRate {
                period: month("2025-02"),
                electricity: Some(Tariff::new(0.2, 0.12)),
                gas: None,
            },
        ])?)
    }

    #[test]
    fn test_build_keeps_incomplete_rows_by_default() -> Result {
        let reference = reference()?;
        let table = ComparisonBuilder::builder().reference(&reference).build().build(
            &tax_table()?,
            &[market("2024-12", 9.0), market("2025-01", 0.4), market("2025-02", 0.41)],
            &[market("2025-01", 1.7)],
        );
        let months = table.iter().map(|row| row.month.label()).collect::<Vec<_>>();
        assert_eq!(months, ["nov-24", "dec-24", "jan-25", "feb-25"]);

        // The reference wins over the live data for its own months:
        assert_eq!(table[1].anwb_electricity, Some(0.27));

        let row = &table[3];
        assert_eq!(row.month, month("2025-02"));
        assert_abs_diff_eq!(row.cbs_electricity.unwrap(), 0.32);
        assert_eq!(row.anwb_electricity, Some(0.41));
        assert_eq!(row.cbs_gas, None);
        assert_eq!(row.anwb_gas, None);
        assert!(!row.is_complete());
        Ok(())
    }

    #[test]
    fn test_build_drops_incomplete_rows() -> Result {
        let reference = reference()?;
        let table = ComparisonBuilder::builder()
            .reference(&reference)
            .require_complete_row(true)
            .build()
            .build(
                &tax_table()?,
                &[market("2025-01", 0.4), market("2025-02", 0.41)],
                &[market("2025-01", 1.7)],
            );
        let months = table.iter().map(|row| row.month.label()).collect::<Vec<_>>();
        assert_eq!(months, ["nov-24", "dec-24", "jan-25"]);
        assert!(table[2].is_complete());
        Ok(())
    }

    #[test]
    fn test_build_without_reference_keeps_all_live_rows() -> Result {
        let reference = ReferenceTable::load(None)?;
        let table = ComparisonBuilder::builder().reference(&reference).build().build(
            &tax_table()?,
            &[market("2021-01", 0.21), market("2024-12", 0.3)],
            &[market("2021-01", 0.9)],
        );
        let months = table.iter().map(|row| row.month.label()).collect::<Vec<_>>();
        assert_eq!(months, ["jan-21", "dec-24", "jan-25", "feb-25"]);
        assert_eq!(table[0].anwb_electricity, Some(0.21));
        assert_eq!(table[0].anwb_gas, Some(0.9));
        assert_eq!(table[1].anwb_electricity, Some(0.3));
        Ok(())
    }

    #[test]
    fn test_to_csv_bytes() -> Result {
        let reference = reference()?;
        let table = ComparisonBuilder::builder().reference(&reference).build().build(
            &tax_table()?,
            &[market("2025-02", 0.412_345)],
            &[],
        );
        let csv = String::from_utf8(table.to_csv_bytes()?)?;
        assert_eq!(
            csv,
            "DATE,CBS stroom,ANWB stroom,CBS gas,ANWB gas\n\
             nov-24,0.2500,0.2400,1.3000,1.2000\n\
             dec-24,0.2600,0.2700,1.3500,1.2500\n\
             jan-25,0.3000,,1.6000,\n\
             feb-25,0.3200,0.4123,,\n"
        );
        Ok(())
    }
}
