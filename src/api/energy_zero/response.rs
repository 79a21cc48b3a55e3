use serde_json::{Map, Value};

use super::PROVIDER;
use crate::{core::point::RawPricePoint, error::PipelineError, prelude::*};

/// Timestamp fields in the order of preference.
const TIMESTAMP_FIELDS: [&str; 5] = ["readingDate", "timestamp", "datetime", "date", "time"];

/// Price fields in the order of preference.
const PRICE_FIELDS: [&str; 4] = ["price", "Price", "value", "Value"];

/// Where the price list lives in the response.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Shape {
    /// `{"data": {"Prices": [...]}}`
    DataPrices,

    /// `{"Prices": [...]}`, the current format.
    Prices,

    /// `{"prices": [...]}`
    LowercasePrices,

    /// `{"result": [...]}`
    Result,

    /// First top-level list whose first object looks like a price point.
    PriceLikeList(String),

    /// `[...]`
    BareArray,
}

impl Shape {
    /// Probe the strategies in order and return the first one that matches.
    pub fn probe(payload: &Value) -> Option<(Self, &[Value])> {
        let Some(object) = payload.as_object() else {
            return payload.as_array().map(|items| (Self::BareArray, items.as_slice()));
        };
        if let Some(items) = object
            .get("data")
            .and_then(|data| data.get("Prices"))
            .and_then(Value::as_array)
        {
            return Some((Self::DataPrices, items));
        }
        if let Some(items) = object.get("Prices").and_then(Value::as_array) {
            return Some((Self::Prices, items));
        }
        if let Some(items) = object.get("prices").and_then(Value::as_array) {
            return Some((Self::LowercasePrices, items));
        }
        if let Some(items) = object.get("result").and_then(Value::as_array) {
            return Some((Self::Result, items));
        }
        object.iter().find_map(|(key, value)| {
            let items = value.as_array()?;
            let first = items.first()?.as_object()?;
            (first.contains_key("price") || first.contains_key("readingDate"))
                .then(|| (Self::PriceLikeList(key.clone()), items.as_slice()))
        })
    }
}

/// Resolve the response into raw price points.
///
/// Items lacking a usable timestamp or price are skipped.
pub fn resolve(payload: &Value) -> Result<Vec<RawPricePoint>, PipelineError> {
    let Some((shape, items)) = Shape::probe(payload) else {
        return Err(PipelineError::data_format(PROVIDER, "no price list in the response"));
    };
    debug!(?shape, n_items = items.len(), "resolved the response shape");
    let points = items.iter().filter_map(resolve_item).collect::<Vec<_>>();
    if points.is_empty() && !items.is_empty() {
        return Err(PipelineError::data_format(
            PROVIDER,
            format!("none of the {} items has a timestamp and a price", items.len()),
        ));
    }
    if points.len() != items.len() {
        warn!(n_items = items.len(), n_points = points.len(), "skipped unresolvable items");
    }
    Ok(points)
}

fn resolve_item(item: &Value) -> Option<RawPricePoint> {
    let item = item.as_object()?;
    let timestamp = first_field(item, &TIMESTAMP_FIELDS)?.as_str()?.to_owned();
    let price = match first_field(item, &PRICE_FIELDS)? {
        Value::Number(price) => price.as_f64()?,
        Value::String(price) => price.trim().parse().ok()?,
        _ => return None,
    };
    let breakdown =
        item.get("breakdown").and_then(|breakdown| serde_json::from_value(breakdown.clone()).ok());
    Some(RawPricePoint { timestamp, price, breakdown })
}

/// The first present field wins, even if its value turns out to be unusable.
fn first_field<'a>(item: &'a Map<String, Value>, fields: &[&str]) -> Option<&'a Value> {
    fields.iter().find_map(|field| item.get(*field))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_current_format_ok() -> Result {
        // language=json
        let payload = serde_json::from_str(
            r#"{
                "Prices": [
                    {"price": 0.23045, "readingDate": "2025-03-01T00:00:00Z"},
                    {"price": 0.2167, "readingDate": "2025-03-01T01:00:00Z"}
                ],
                "intervalType": 4,
                "average": 0.22358,
                "fromDate": "2025-03-01T00:00:00Z",
                "tillDate": "2025-03-01T01:59:59.999Z"
            }"#,
        )?;
        assert_eq!(Shape::probe(&payload).map(|(shape, _)| shape), Some(Shape::Prices));
        assert_eq!(resolve(&payload)?, [
            RawPricePoint::new("2025-03-01T00:00:00Z", 0.23045),
            RawPricePoint::new("2025-03-01T01:00:00Z", 0.2167),
        ]);
        Ok(())
    }

    #[test]
    fn test_nested_data_wins() -> Result {
        // language=json
        let payload = serde_json::from_str(
            r#"{
                "data": {"Prices": [{"price": 1.0, "readingDate": "2025-03-01T00:00:00Z"}]},
                "Prices": [{"price": 2.0, "readingDate": "2025-03-01T00:00:00Z"}]
            }"#,
        )?;
        assert_eq!(resolve(&payload)?, [RawPricePoint::new("2025-03-01T00:00:00Z", 1.0)]);
        Ok(())
    }

    #[test]
    fn test_result_and_aliases_ok() -> Result {
        // language=json
        let payload = serde_json::from_str(
            r#"{
                "result": [
                    {"timestamp": "2025-03-01T00:00:00+01:00", "Value": "0.5"},
                    {"time": "2025-03-01T01:00:00", "Price": 0}
                ]
            }"#,
        )?;
        assert_eq!(Shape::probe(&payload).map(|(shape, _)| shape), Some(Shape::Result));
        assert_eq!(resolve(&payload)?, [
            RawPricePoint::new("2025-03-01T00:00:00+01:00", 0.5),
            RawPricePoint::new("2025-03-01T01:00:00", 0.0),
        ]);
        Ok(())
    }

    #[test]
    fn test_price_like_list_ok() -> Result {
        // language=json
        let payload = serde_json::from_str(
            r#"{
                "meta": [{"name": "dynamic"}],
                "items": [{"readingDate": "2025-03-01T00:00:00Z", "price": 0.1}]
            }"#,
        )?;
        assert_eq!(
            Shape::probe(&payload).map(|(shape, _)| shape),
            Some(Shape::PriceLikeList("items".into())),
        );
        assert_eq!(resolve(&payload)?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_bare_array_ok() -> Result {
        // language=json
        let payload =
            serde_json::from_str(r#"[{"date": "2025-03-01", "value": 1.25}, {"price": 1.0}]"#)?;
        assert_eq!(Shape::probe(&payload).map(|(shape, _)| shape), Some(Shape::BareArray));
        assert_eq!(resolve(&payload)?, [RawPricePoint::new("2025-03-01", 1.25)]);
        Ok(())
    }

    #[test]
    fn test_first_present_field_wins() -> Result {
        // language=json
        let payload = serde_json::from_str(
            r#"{"Prices": [{"readingDate": null, "timestamp": "2025-03-01T00:00:00Z", "price": 0.1}, {"readingDate": "2025-03-01T01:00:00Z", "price": 0.2}]}"#,
        )?;
        assert_eq!(resolve(&payload)?, [RawPricePoint::new("2025-03-01T01:00:00Z", 0.2)]);
        Ok(())
    }

    #[test]
    fn test_breakdown_ok() -> Result {
        // language=json
        let payload = serde_json::from_str(
            r#"{"Prices": [{
                "readingDate": "2025-03-01T00:00:00Z",
                "price": 0.4,
                "breakdown": {"base_price": 0.25, "energy_tax": 0.1, "procurement_costs": 0.05}
            }]}"#,
        )?;
        let points = resolve(&payload)?;
        let breakdown = points[0].breakdown.unwrap();
        assert_abs_diff_eq!(breakdown.energy_tax, 0.1);
        assert_eq!(breakdown.vat, None);
        Ok(())
    }

    #[test]
    fn test_empty_list_ok() -> Result {
        // language=json
        let payload = serde_json::from_str(r#"{"Prices": []}"#)?;
        assert!(resolve(&payload)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_unrecognized_shape() -> Result {
        // language=json
        let payload = serde_json::from_str(r#"{"message": "Internal error", "items": []}"#)?;
        assert!(matches!(resolve(&payload), Err(PipelineError::DataFormat { .. })));

        // language=json
        let payload = serde_json::from_str(r#"{"Prices": [{"foo": 1}]}"#)?;
        assert!(matches!(resolve(&payload), Err(PipelineError::DataFormat { .. })));
        Ok(())
    }
}
