mod check;
mod http;
mod output;
mod rates;
mod reference;
mod run;

use clap::{Parser, Subcommand};

pub use self::{check::check, rates::rates, run::run};
use crate::cli::{check::CheckArgs, rates::RatesArgs, run::RunArgs};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: fetch the prices, refresh the monthly datasets, and build the comparison.
    #[clap(name = "run")]
    Run(Box<RunArgs>),

    /// Check the reference table and the persisted datasets for inconsistent months.
    #[clap(name = "check")]
    Check(Box<CheckArgs>),

    /// Fetch and print the official monthly rates.
    #[clap(name = "rates")]
    Rates(Box<RatesArgs>),
}
