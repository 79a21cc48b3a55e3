use std::fmt::{Display, Formatter};

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::{
    core::{
        month::Month,
        point::{Breakdown, PricePoint},
        series::{CanonicalSeries, MonthlyAggregate},
        tax::{Commodity, TaxTable},
    },
    fmt::serialize_price,
    prelude::*,
};

/// Monthly market price enriched with the official energy tax and the procurement costs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReconciledRow {
    pub month: Month,

    #[serde(serialize_with = "serialize_price")]
    pub base_price: f64,

    #[serde(serialize_with = "serialize_price")]
    pub energy_tax: f64,

    #[serde(serialize_with = "serialize_price")]
    pub procurement_costs: f64,

    #[serde(serialize_with = "serialize_price")]
    pub total_price: f64,
}

/// Month that could not be reconciled and was left out.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ReconciliationGap {
    pub month: Month,
    pub reason: GapReason,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GapReason {
    /// No official rates for the month at all.
    MissingRate,

    /// Official rates exist, but not for the commodity.
    MissingTariff(Commodity),
}

impl Display for ReconciliationGap {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.reason {
            GapReason::MissingRate => write!(f, "no official rates for {}", self.month),
            GapReason::MissingTariff(commodity) => {
                write!(f, "no official {commodity} tariff for {}", self.month)
            }
        }
    }
}

#[must_use]
pub struct Reconciliation {
    pub rows: Vec<ReconciledRow>,
    pub gaps: Vec<ReconciliationGap>,
}

#[derive(Builder)]
pub struct Reconciler<'a> {
    tax_table: &'a TaxTable,
    commodity: Commodity,

    /// Fixed procurement costs per unit, including VAT.
    procurement_costs: f64,
}

impl Reconciler<'_> {
    /// Join the monthly aggregates with the tax table.
    ///
    /// Months without a matching tariff are skipped with a warning, the rest still reconciles.
    #[instrument(skip_all, fields(commodity = %self.commodity, n_aggregates = aggregates.len()))]
    pub fn reconcile(&self, aggregates: &[MonthlyAggregate]) -> Reconciliation {
        let mut rows = Vec::with_capacity(aggregates.len());
        let mut gaps = Vec::new();
        for aggregate in aggregates {
            match self.energy_tax(aggregate.month) {
                Ok(energy_tax) => rows.push(ReconciledRow {
                    month: aggregate.month,
                    base_price: aggregate.mean_price,
                    energy_tax,
                    procurement_costs: self.procurement_costs,
                    total_price: aggregate.mean_price + energy_tax + self.procurement_costs,
                }),
                Err(gap) => {
                    warn!("{gap}, skipping");
                    gaps.push(gap);
                }
            }
        }
        info!(n_rows = rows.len(), n_gaps = gaps.len(), "reconciled");
        Reconciliation { rows, gaps }
    }

    /// All-in price points with their breakdown, for the points whose month reconciles.
    pub fn enrich(&self, series: &CanonicalSeries) -> Vec<PricePoint> {
        series
            .iter()
            .filter_map(|point| {
                let energy_tax = self.energy_tax(Month::of(&point.timestamp)).ok()?;
                Some(PricePoint {
                    timestamp: point.timestamp,
                    price: point.price + energy_tax + self.procurement_costs,
                    breakdown: Some(Breakdown {
                        base_price: point.price,
                        energy_tax,
                        procurement_costs: self.procurement_costs,
                        vat: None,
                    }),
                })
            })
            .collect()
    }

    fn energy_tax(&self, month: Month) -> Result<f64, ReconciliationGap> {
        let rate = self
            .tax_table
            .get(month)
            .ok_or(ReconciliationGap { month, reason: GapReason::MissingRate })?;
        let tariff = rate.tariff(self.commodity).ok_or(ReconciliationGap {
            month,
            reason: GapReason::MissingTariff(self.commodity),
        })?;
        Ok(tariff.energy_tax)
    }
}
