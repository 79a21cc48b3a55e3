use clap::Parser;

use crate::{
    cli::{output::OutputArgs, reference::ReferenceArgs},
    core::{
        consistency::{Finding, LabelList, check_pair},
        dataset::MonthlyDataset,
        reconcile::ReconciledRow,
        reference::ReferenceSource,
        tax::Commodity,
    },
    output::{CommodityArtifacts, Output},
    prelude::*,
    tables::build_findings_table,
};

#[derive(Parser)]
pub struct CheckArgs {
    #[clap(flatten)]
    output: OutputArgs,

    #[clap(flatten)]
    reference: ReferenceArgs,
}

#[instrument(skip_all)]
pub fn check(args: &CheckArgs) -> Result {
    let mut findings = ReferenceSource::load(args.reference.path.as_deref())?.findings();

    let output = args.output.output();
    let electricity = dataset_labels(&output, Commodity::Electricity, &mut findings);
    let gas = dataset_labels(&output, Commodity::Gas, &mut findings);
    if let (Some(electricity), Some(gas)) = (electricity, gas) {
        findings.extend(check_pair(&electricity, &gas));
    }

    if findings.is_empty() {
        info!("all consistent");
        return Ok(());
    }
    println!("{}", build_findings_table(&findings));
    bail!("found {} inconsistencies", findings.len());
}

/// Load the reconciled dataset as month labels. A dataset that fails to load becomes a finding.
fn dataset_labels(
    output: &Output,
    commodity: Commodity,
    findings: &mut Vec<Finding>,
) -> Option<LabelList<'static>> {
    let name = CommodityArtifacts::of(commodity).prices;
    match MonthlyDataset::<ReconciledRow>::read_from(&output.path(name)) {
        Ok(dataset) => {
            Some(LabelList::new(name, dataset.rows().iter().map(|row| row.month.label())))
        }
        Err(error) => {
            findings.push(Finding::Unreadable { list: name.into(), reason: format!("{error:#}") });
            None
        }
    }
}
