use std::{thread::sleep, time::Duration};

use chrono::TimeDelta;

use crate::{
    core::{
        interval::Interval,
        point::RawPricePoint,
        series::{Normalized, Normalizer},
        tax::Commodity,
    },
    prelude::*,
};

/// Provider of raw price records for a commodity.
pub trait PriceSource {
    fn get_prices(&self, commodity: Commodity, interval: Interval) -> Result<Vec<RawPricePoint>>;
}

/// Split a long fetch into sequential requests.
#[derive(Copy, Clone, Debug)]
pub struct Batching {
    pub window: TimeDelta,

    /// Pause between the requests.
    pub delay: Duration,
}

/// Fetch and normalize the commodity prices over the interval.
///
/// With batching, every batch goes into the accumulator before the next request starts,
/// so the first record per unit wins across the batches too.
#[instrument(skip_all, fields(commodity = %commodity, interval = ?interval))]
pub fn fetch_series<S: PriceSource + ?Sized>(
    source: &S,
    commodity: Commodity,
    interval: Interval,
    batching: Option<Batching>,
) -> Result<Normalized> {
    let mut normalizer = Normalizer::new(commodity.resolution());
    match batching {
        None => {
            normalizer.extend(source.get_prices(commodity, interval)?)?;
        }
        Some(batching) => {
            for (i, window) in interval.windows(batching.window).enumerate() {
                if i != 0 {
                    sleep(batching.delay);
                }
                let batch = source.get_prices(commodity, window)?;
                debug!(?window, n_records = batch.len(), "fetched a batch");
                normalizer.extend(batch)?;
            }
        }
    }
    let normalized = normalizer.finish();
    info!(
        n_points = normalized.series.len(),
        n_duplicates = normalized.duplicates.len(),
        n_skipped = normalized.n_skipped,
        "normalized",
    );
    Ok(normalized)
}
