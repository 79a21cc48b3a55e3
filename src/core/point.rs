use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provider record as resolved by the provider adapter, before normalization.
#[derive(Clone, Debug, PartialEq)]
pub struct RawPricePoint {
    /// ISO-8601 timestamp as sent by the provider, with or without an offset.
    pub timestamp: String,

    pub price: f64,

    pub breakdown: Option<Breakdown>,
}

impl RawPricePoint {
    pub fn new(timestamp: impl Into<String>, price: f64) -> Self {
        Self { timestamp: timestamp.into(), price, breakdown: None }
    }
}

/// Normalized price observation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PricePoint {
    #[serde(rename = "time")]
    pub timestamp: DateTime<Utc>,

    pub price: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<Breakdown>,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub base_price: f64,
    pub energy_tax: f64,
    pub procurement_costs: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat: Option<f64>,
}
