use crate::{
    core::{
        dataset::{MonthlyDataset, MonthlyRecord},
        month::Month,
    },
    prelude::*,
};

#[must_use]
pub enum MergeOutcome<R> {
    /// Persisted prefix before the watermark followed by the fresh rows.
    Merged(MonthlyDataset<R>),

    /// Nothing fresh: the persisted dataset is reused verbatim.
    Skipped(MonthlyDataset<R>),
}

impl<R> MergeOutcome<R> {
    pub fn into_dataset(self) -> MonthlyDataset<R> {
        match self {
            Self::Merged(dataset) | Self::Skipped(dataset) => dataset,
        }
    }
}

impl<R: MonthlyRecord> MonthlyDataset<R> {
    /// The earliest month to re-fetch.
    ///
    /// The last known month is always re-fetched since it may have been incomplete.
    /// Without any rows, everything since the epoch is fetched.
    #[must_use]
    pub fn watermark(&self, epoch: Month) -> Month {
        self.last_month().unwrap_or(epoch)
    }

    /// Merge the freshly fetched rows into the dataset.
    ///
    /// Fresh rows before the watermark are ignored: those months are final.
    #[instrument(skip_all, fields(watermark = %watermark))]
    pub fn refresh(self, watermark: Month, mut fresh: Vec<R>) -> MergeOutcome<R> {
        fresh.retain(|row| row.month() >= watermark);
        if fresh.is_empty() {
            warn!(n_rows = self.len(), "nothing fresh, keeping the persisted dataset");
            return MergeOutcome::Skipped(self);
        }
        let dataset = merge(self, watermark, fresh);
        info!(n_rows = dataset.len(), last_month = ?dataset.last_month(), "merged");
        MergeOutcome::Merged(dataset)
    }
}

/// Keep the persisted rows strictly before the watermark and append the fresh ones.
///
/// On a duplicate month, the fresh row wins. The result is sorted by month.
pub fn merge<R: MonthlyRecord>(
    persisted: MonthlyDataset<R>,
    watermark: Month,
    fresh: Vec<R>,
) -> MonthlyDataset<R> {
    let kept = persisted.into_rows().into_iter().filter(|row| row.month() < watermark);
    MonthlyDataset::from_rows(kept.chain(fresh))
}
