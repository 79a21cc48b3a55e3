use serde::Deserialize;
use serde_with::{VecSkipError, serde_as};
use ureq::Agent;

use crate::{
    api::client::get_json,
    core::{
        month::Month,
        tax::{Tariff, TaxRate, TaxTable},
    },
    error::PipelineError,
    prelude::*,
};

const PROVIDER: &str = "CBS";

/// Average energy prices for consumers, table `85592NED`.
const URL: &str = "https://opendata.cbs.nl/ODataApi/odata/85592NED/TypedDataSet";

/// Prices including VAT.
const INCLUDING_VAT: &str = "A048944";

/// Statistics Netherlands open data.
pub struct Api<'a> {
    client: &'a Agent,
}

impl<'a> Api<'a> {
    pub const fn new(client: &'a Agent) -> Self {
        Self { client }
    }

    #[instrument(skip_all)]
    pub fn get_tax_table(&self) -> Result<TaxTable> {
        info!("fetching the tax rates…");
        let response = get_json::<Response>(self.client, PROVIDER, URL)?;
        let table = TaxTable::try_from_rates(response.into_rates())?;
        if table.is_empty() {
            let error = PipelineError::data_format(PROVIDER, "no monthly rates including VAT");
            return Err(error.into());
        }
        info!(n_rates = table.len(), "fetched");
        Ok(table)
    }
}

#[serde_as]
#[derive(Deserialize)]
struct Response {
    #[serde_as(as = "VecSkipError<_>")]
    value: Vec<Item>,
}

impl Response {
    /// Monthly rates including VAT, sorted by period.
    fn into_rates(self) -> Vec<TaxRate> {
        let mut rates = self.value.into_iter().filter_map(Item::into_rate).collect::<Vec<_>>();
        rates.sort_by_key(|rate| rate.period);
        rates
    }
}

#[derive(Deserialize)]
struct Item {
    #[serde(rename = "Btw")]
    vat: String,

    /// For example, `2024MM03`. Yearly and quarterly periods are `JJ` and `KW`.
    #[serde(rename = "Perioden")]
    period: String,

    #[serde(rename = "VariabelLeveringstariefContractprijs_3")]
    gas_base_rate: Option<f64>,

    #[serde(rename = "Energiebelasting_6")]
    gas_energy_tax: Option<f64>,

    #[serde(rename = "VariabelLeveringstariefContractprijs_9")]
    electricity_base_rate: Option<f64>,

    #[serde(rename = "Energiebelasting_12")]
    electricity_energy_tax: Option<f64>,
}

impl Item {
    fn into_rate(self) -> Option<TaxRate> {
        if self.vat.trim() != INCLUDING_VAT {
            return None;
        }
        let (year, month) = self.period.trim().split_once("MM")?;
        let period = year
            .parse::<i32>()
            .ok()
            .zip(month.parse::<u32>().ok())
            .and_then(|(year, month)| Month::new(year, month));
        let Some(period) = period else {
            warn!(period = self.period, "skipped an item with a malformed period");
            return None;
        };
        let electricity = Option::zip(self.electricity_base_rate, self.electricity_energy_tax)
            .map(|(base_rate, energy_tax)| Tariff::new(base_rate, energy_tax));
        let gas = Option::zip(self.gas_base_rate, self.gas_energy_tax)
            .map(|(base_rate, energy_tax)| Tariff::new(base_rate, energy_tax));
        if electricity.is_none() && gas.is_none() {
            return None;
        }
        Some(TaxRate { period, electricity, gas })
    }
}
