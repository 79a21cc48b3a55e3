use std::{fmt::Debug, path::Path};

use itertools::Itertools;
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    core::{month::Month, reconcile::ReconciledRow, series::MonthlyAggregate},
    error::PipelineError,
    prelude::*,
};

/// Row of a persisted monthly dataset.
pub trait MonthlyRecord: Serialize + DeserializeOwned {
    fn month(&self) -> Month;
}

impl MonthlyRecord for ReconciledRow {
    fn month(&self) -> Month {
        self.month
    }
}

impl MonthlyRecord for MonthlyAggregate {
    fn month(&self) -> Month {
        self.month
    }
}

/// Persisted monthly dataset: unique by month and sorted ascending.
///
/// Never edited in place: the merge engine always builds a new one.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct MonthlyDataset<R> {
    rows: Vec<R>,
}

impl<R> Default for MonthlyDataset<R> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<R: MonthlyRecord> MonthlyDataset<R> {
    /// Sort and deduplicate the rows. On a duplicate month, the later row wins.
    pub fn from_rows(rows: impl IntoIterator<Item = R>) -> Self {
        let mut rows = rows.into_iter().collect_vec();
        rows.reverse();
        let rows = rows.into_iter().unique_by(R::month).sorted_by_key(R::month).collect();
        Self { rows }
    }

    /// Read the dataset from the CSV file. A missing file is an empty dataset.
    ///
    /// A file that is not strictly ascending by month is rejected.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_from(path: &Path) -> Result<Self> {
        if !path.is_file() {
            info!("no dataset yet");
            return Ok(Self::default());
        }
        let rows = csv::Reader::from_path(path)?
            .deserialize()
            .collect::<Result<Vec<R>, _>>()
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        if let Some((previous, next)) = rows
            .iter()
            .map(R::month)
            .tuple_windows()
            .find(|(previous, next)| previous >= next)
        {
            let path = path.to_path_buf();
            return Err(PipelineError::UnsortedDataset { path, previous, next }.into());
        }
        info!(n_rows = rows.len(), last_month = ?rows.last().map(R::month), "loaded");
        Ok(Self { rows })
    }

    /// Serialize the whole dataset as CSV with a header.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in &self.rows {
            writer.serialize(row)?;
        }
        Ok(writer.into_inner()?)
    }

    #[must_use]
    pub fn last_month(&self) -> Option<Month> {
        self.rows.last().map(R::month)
    }

    #[must_use]
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
