mod response;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use ureq::Agent;

use crate::{
    api::client::get_json,
    core::{interval::Interval, point::RawPricePoint, provider::PriceSource, tax::Commodity},
    prelude::*,
};

const PROVIDER: &str = "EnergyZero";

const URL: &str = "https://api.energyzero.nl/v1/energyprices";

/// EnergyZero dynamic tariffs, including VAT.
pub struct Api<'a> {
    client: &'a Agent,
}

impl<'a> Api<'a> {
    pub const fn new(client: &'a Agent) -> Self {
        Self { client }
    }
}

impl PriceSource for Api<'_> {
    #[instrument(skip_all, fields(commodity = %commodity, interval = ?interval))]
    fn get_prices(&self, commodity: Commodity, interval: Interval) -> Result<Vec<RawPricePoint>> {
        let url = format!("{URL}?{}", serde_qs::to_string(&Query::new(commodity, interval))?);
        let payload = get_json::<serde_json::Value>(self.client, PROVIDER, &url)?;
        let points = response::resolve(&payload)?;
        info!(n_points = points.len(), "fetched");
        Ok(points)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Query {
    from_date: String,
    till_date: String,
    interval: u8,
    usage_type: u8,
    incl_btw: bool,
}

impl Query {
    fn new(commodity: Commodity, interval: Interval) -> Self {
        let (resolution, usage_type) = match commodity {
            Commodity::Electricity => (4, 1),
            Commodity::Gas => (5, 3),
        };
        Self {
            from_date: format_instant(interval.start, "000"),
            // The end is exclusive, the API's till date is not:
            till_date: format_instant(interval.end - TimeDelta::seconds(1), "999"),
            interval: resolution,
            usage_type,
            incl_btw: true,
        }
    }
}

fn format_instant(instant: DateTime<Utc>, millis: &str) -> String {
    format!("{}.{millis}Z", instant.format("%Y-%m-%dT%H:%M:%S"))
}
