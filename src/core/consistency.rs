use std::{
    collections::BTreeSet,
    fmt::{Display, Formatter},
};

use itertools::Itertools;

use crate::core::month::Month;

/// Month labels of one commodity, in the order they are listed.
pub struct LabelList<'a> {
    pub name: &'a str,
    pub labels: Vec<String>,
}

impl<'a> LabelList<'a> {
    pub fn new(name: &'a str, labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { name, labels: labels.into_iter().map(Into::into).collect() }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Finding {
    DuplicateMonth { list: String, label: String },
    OnlyInOneList { list: String, label: String },
    MalformedLabel { list: String, label: String },
    Unsorted { list: String },
    Unreadable { list: String, reason: String },
}

impl Finding {
    #[must_use]
    pub fn list(&self) -> &str {
        match self {
            Self::DuplicateMonth { list, .. }
            | Self::OnlyInOneList { list, .. }
            | Self::MalformedLabel { list, .. }
            | Self::Unsorted { list }
            | Self::Unreadable { list, .. } => list,
        }
    }
}

impl Display for Finding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateMonth { label, .. } => write!(f, "duplicate month `{label}`"),
            Self::OnlyInOneList { label, .. } => write!(f, "month `{label}` is missing elsewhere"),
            Self::MalformedLabel { label, .. } => write!(f, "malformed month label `{label}`"),
            Self::Unsorted { .. } => write!(f, "not sorted by month"),
            Self::Unreadable { reason, .. } => write!(f, "unreadable: {reason}"),
        }
    }
}

/// Check a pair of month lists that are expected to cover the same months.
#[must_use]
pub fn check_pair(left: &LabelList, right: &LabelList) -> Vec<Finding> {
    let mut findings = check_list(left);
    findings.extend(check_list(right));
    findings.extend(only_in(left, right));
    findings.extend(only_in(right, left));
    findings
}

fn check_list(list: &LabelList) -> Vec<Finding> {
    let mut findings = Vec::new();

    for label in list.labels.iter().duplicates() {
        findings.push(Finding::DuplicateMonth { list: list.name.into(), label: label.clone() });
    }

    let mut months = Vec::with_capacity(list.labels.len());
    for label in &list.labels {
        match Month::from_label(label) {
            Ok(month) => months.push(month),
            Err(_) => findings
                .push(Finding::MalformedLabel { list: list.name.into(), label: label.clone() }),
        }
    }
    if !months.is_sorted() {
        findings.push(Finding::Unsorted { list: list.name.into() });
    }

    findings
}

fn only_in(this: &LabelList, other: &LabelList) -> Vec<Finding> {
    let other = other.labels.iter().collect::<BTreeSet<_>>();
    this.labels
        .iter()
        .unique()
        .filter(|label| !other.contains(label))
        .map(|label| Finding::OnlyInOneList { list: this.name.into(), label: label.clone() })
        .collect()
}
