use std::path::Path;

use itertools::Itertools;
use serde::Deserialize;

use crate::{
    core::{
        comparison::ComparisonRow,
        consistency::{Finding, LabelList, check_pair},
        month::Month,
    },
    prelude::*,
};

const EMBEDDED: &str = include_str!("../../data/reference.toml");

/// Reference file as written, before any validation.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceSource {
    #[serde(default)]
    pub electricity: Vec<ReferenceEntry>,

    #[serde(default)]
    pub gas: Vec<ReferenceEntry>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceEntry {
    /// Comparison label, for example `jan-21`.
    pub month: String,

    pub cbs: Option<f64>,
    pub anwb: Option<f64>,
}

impl ReferenceSource {
    /// Read the reference file, or fall back to the embedded one.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read `{}`", path.display()))?;
                Self::from_toml(&text).with_context(|| format!("failed to parse `{}`", path.display()))
            }
            None => Self::from_toml(EMBEDDED).context("failed to parse the embedded reference table"),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    #[must_use]
    pub fn findings(&self) -> Vec<Finding> {
        check_pair(
            &LabelList::new(
                "reference electricity",
                self.electricity.iter().map(|entry| &*entry.month),
            ),
            &LabelList::new("reference gas", self.gas.iter().map(|entry| &*entry.month)),
        )
    }
}

/// Fixed historical comparison block, prepended verbatim to the live rows.
#[must_use]
#[derive(Clone, Debug, Default)]
pub struct ReferenceTable {
    rows: Vec<ComparisonRow>,
}

impl ReferenceTable {
    /// Load and validate the reference table.
    #[instrument(skip_all)]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let table = Self::try_from(ReferenceSource::load(path)?)?;
        info!(n_rows = table.rows.len(), last_month = ?table.last_month(), "loaded the reference table");
        Ok(table)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Self::try_from(ReferenceSource::from_toml(text)?)
    }

    #[must_use]
    pub fn last_month(&self) -> Option<Month> {
        self.rows.last().map(|row| row.month)
    }

    #[must_use]
    pub fn rows(&self) -> &[ComparisonRow] {
        &self.rows
    }
}

impl TryFrom<ReferenceSource> for ReferenceTable {
    type Error = Error;

    fn try_from(source: ReferenceSource) -> Result<Self> {
        let findings = source.findings();
        if !findings.is_empty() {
            bail!(
                "inconsistent reference table: {}",
                findings.iter().map(|finding| format!("{}: {finding}", finding.list())).join("; "),
            );
        }
        // Both lists now have exactly the same months in the same order.
        let rows = source
            .electricity
            .into_iter()
            .zip(source.gas)
            .map(|(electricity, gas)| {
                Ok(ComparisonRow {
                    month: Month::from_label(&electricity.month)?,
                    cbs_electricity: electricity.cbs,
                    anwb_electricity: electricity.anwb,
                    cbs_gas: gas.cbs,
                    anwb_gas: gas.anwb,
                })
            })
            .collect::<Result<_>>()?;
        Ok(Self { rows })
    }
}
