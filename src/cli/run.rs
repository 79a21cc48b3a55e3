use bon::Builder;
use chrono::{DateTime, TimeDelta, Utc};
use clap::Parser;
use serde::Serialize;

use crate::{
    api::{cbs, energy_zero},
    cli::{http::HttpArgs, output::OutputArgs, reference::ReferenceArgs},
    core::{
        comparison::ComparisonBuilder,
        dataset::MonthlyDataset,
        interval::Interval,
        month::Month,
        point::PricePoint,
        provider::{Batching, PriceSource, fetch_series},
        reconcile::{ReconciledRow, Reconciler},
        reference::ReferenceTable,
        series::{GapReport, MonthlyAggregate, MonthlyMeans},
        tax::{Commodity, TaxRate, TaxTable},
    },
    output::{CBS_RATES, COMPARISON, CommodityArtifacts, Output, RunLogEntry},
    prelude::*,
    tables::build_comparison_table,
};

#[derive(Parser)]
pub struct RunArgs {
    /// First month to fetch when there is no persisted dataset yet.
    #[clap(long, env = "EPOCH", default_value = "2021-01")]
    epoch: Month,

    /// Electricity procurement costs in €/kWh, including VAT.
    #[clap(long, env = "ELECTRICITY_PROCUREMENT_COSTS", default_value = "0.0484")]
    electricity_procurement_costs: f64,

    /// Gas procurement costs in €/m³, including VAT.
    #[clap(long, env = "GAS_PROCUREMENT_COSTS", default_value = "0.0715231")]
    gas_procurement_costs: f64,

    /// Gas prices are fetched in windows of this length.
    #[clap(long, env = "GAS_BATCH_WINDOW", default_value = "90d")]
    gas_batch_window: humantime::Duration,

    /// Pause between the gas batch requests.
    #[clap(long, env = "GAS_BATCH_DELAY", default_value = "1s")]
    gas_batch_delay: humantime::Duration,

    /// History of the all-in price points in the JSON artifacts.
    #[clap(long, env = "POINTS_HISTORY", default_value = "450d")]
    points_history: humantime::Duration,

    /// Leave out the comparison rows that lack any of the four prices.
    #[clap(long, env = "REQUIRE_COMPLETE_ROW")]
    require_complete_row: bool,

    #[clap(flatten)]
    http: HttpArgs,

    #[clap(flatten)]
    output: OutputArgs,

    #[clap(flatten)]
    reference: ReferenceArgs,
}

#[instrument(skip_all)]
pub fn run(args: &RunArgs) -> Result {
    let output = args.output.output();
    let reference = ReferenceTable::load(args.reference.path.as_deref())?;

    let agent = args.http.agent();
    let tax_table = cbs::Api::new(&agent).get_tax_table()?;
    let energy_zero = energy_zero::Api::new(&agent);

    Pipeline::builder()
        .source(&energy_zero)
        .tax_table(&tax_table)
        .reference(&reference)
        .output(&output)
        .epoch(args.epoch)
        .electricity_procurement_costs(args.electricity_procurement_costs)
        .gas_procurement_costs(args.gas_procurement_costs)
        .gas_batching(Batching {
            window: TimeDelta::from_std(args.gas_batch_window.into())?,
            delay: args.gas_batch_delay.into(),
        })
        .points_history(TimeDelta::from_std(args.points_history.into())?)
        .require_complete_row(args.require_complete_row)
        .now(Utc::now())
        .build()
        .execute()
}

/// One refresh of both commodities against the already fetched tax table.
#[derive(Builder)]
struct Pipeline<'a, S: PriceSource> {
    source: &'a S,
    tax_table: &'a TaxTable,
    reference: &'a ReferenceTable,
    output: &'a Output,
    epoch: Month,
    electricity_procurement_costs: f64,
    gas_procurement_costs: f64,
    gas_batching: Batching,

    /// Length of the price point history in the JSON artifacts.
    points_history: TimeDelta,

    #[builder(default)]
    require_complete_row: bool,

    now: DateTime<Utc>,
}

impl<S: PriceSource> Pipeline<'_, S> {
    #[instrument(skip_all)]
    fn execute(&self) -> Result {
        // Electricity is the primary series: its failure aborts the run before anything is written.
        let electricity = self
            .refresh(Commodity::Electricity)
            .context("failed to refresh the electricity prices")?;
        let gas = self.refresh(Commodity::Gas).context("failed to refresh the gas prices");

        publish_json(self.output, CBS_RATES, &RatesArtifact {
            last_updated: self.now,
            rates: self.tax_table.rates().collect(),
        })?;
        electricity.publish(self.output, self.now)?;
        let gas_prices = match &gas {
            Ok(gas) => {
                gas.publish(self.output, self.now)?;
                gas.prices.clone()
            }
            Err(error) => {
                error!("{error:#}, keeping the gas dataset on disk");
                self.persisted_gas_prices()
            }
        };

        let comparison = ComparisonBuilder::builder()
            .reference(self.reference)
            .require_complete_row(self.require_complete_row)
            .build()
            .build(self.tax_table, electricity.prices.rows(), gas_prices.rows());
        let changed = self.output.publish(COMPARISON, &comparison.to_csv_bytes()?)?;
        println!("{}", build_comparison_table(&comparison));
        self.output.append_run_log(&RunLogEntry {
            timestamp: self.now,
            n_rows: comparison.len(),
            changed,
        })?;
        info!(n_rows = comparison.len(), changed, "compared");

        gas.map(|_| ())
    }

    /// Gas dataset for the comparison when the gas refresh has failed.
    fn persisted_gas_prices(&self) -> MonthlyDataset<ReconciledRow> {
        let path = self.output.path(CommodityArtifacts::of(Commodity::Gas).prices);
        match MonthlyDataset::read_from(&path) {
            Ok(dataset) if dataset.is_empty() => {
                warn!("no gas dataset on disk, the comparison goes without market gas prices");
                dataset
            }
            Ok(dataset) => dataset,
            Err(error) => {
                error!("{error:#}, the comparison goes without market gas prices");
                MonthlyDataset::default()
            }
        }
    }

    const fn procurement_costs(&self, commodity: Commodity) -> f64 {
        match commodity {
            Commodity::Electricity => self.electricity_procurement_costs,
            Commodity::Gas => self.gas_procurement_costs,
        }
    }

    const fn batching(&self, commodity: Commodity) -> Option<Batching> {
        match commodity {
            Commodity::Electricity => None,
            Commodity::Gas => Some(self.gas_batching),
        }
    }

    /// Fetch everything since the earliest watermark and merge it into the persisted datasets.
    ///
    /// The fetch reaches further back when the price point history asks for it,
    /// the months before the watermarks are then left as persisted.
    #[instrument(skip_all, fields(commodity = %commodity))]
    fn refresh(&self, commodity: Commodity) -> Result<Refreshed> {
        let artifacts = CommodityArtifacts::of(commodity);
        let prices = MonthlyDataset::<ReconciledRow>::read_from(&self.output.path(artifacts.prices))?;
        let averages =
            MonthlyDataset::<MonthlyAggregate>::read_from(&self.output.path(artifacts.averages))?;
        let prices_watermark = prices.watermark(self.epoch);
        let averages_watermark = averages.watermark(self.epoch);
        let since = prices_watermark.min(averages_watermark);
        info!(%prices_watermark, %averages_watermark, "refreshing…");

        // Day-ahead prices are already published for tomorrow:
        let until = self.now + TimeDelta::days(1);
        let points_since = until - self.points_history;
        let interval = Interval::new(since.start().min(points_since), until);
        let normalized = fetch_series(self.source, commodity, interval, self.batching(commodity))?;
        if commodity == Commodity::Electricity {
            GapReport::detect(&normalized.series, &normalized.duplicates)?.log();
        }

        let aggregates =
            normalized.series.iter().map(|point| (point.timestamp, point.price)).monthly_means();
        let reconciler = Reconciler::builder()
            .tax_table(self.tax_table)
            .commodity(commodity)
            .procurement_costs(self.procurement_costs(commodity))
            .build();
        let reconciliation = reconciler.reconcile(&aggregates);

        let mut points = reconciler.enrich(&normalized.series);
        points.retain(|point| point.timestamp >= points_since);

        Ok(Refreshed {
            commodity,
            prices: prices.refresh(prices_watermark, reconciliation.rows).into_dataset(),
            averages: averages.refresh(averages_watermark, aggregates).into_dataset(),
            points,
        })
    }
}

/// Refreshed datasets of one commodity, not yet written.
struct Refreshed {
    commodity: Commodity,
    prices: MonthlyDataset<ReconciledRow>,
    averages: MonthlyDataset<MonthlyAggregate>,
    points: Vec<PricePoint>,
}

impl Refreshed {
    fn publish(&self, output: &Output, now: DateTime<Utc>) -> Result {
        let artifacts = CommodityArtifacts::of(self.commodity);
        output.publish(artifacts.prices, &self.prices.to_csv_bytes()?)?;
        output.publish(artifacts.averages, &self.averages.to_csv_bytes()?)?;
        publish_json(output, artifacts.points, &PricesArtifact {
            last_updated: now,
            prices: &self.points,
        })?;
        Ok(())
    }
}

#[derive(Serialize)]
struct RatesArtifact<'a> {
    last_updated: DateTime<Utc>,
    rates: Vec<&'a TaxRate>,
}

#[derive(Serialize)]
struct PricesArtifact<'a> {
    last_updated: DateTime<Utc>,
    prices: &'a [PricePoint],
}

fn publish_json<T: Serialize>(output: &Output, name: &str, artifact: &T) -> Result {
    output.publish(name, &serde_json::to_vec_pretty(artifact)?)?;
    Ok(())
}
