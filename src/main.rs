#![doc = include_str!("../README.md")]

mod api;
mod cli;
mod core;
mod error;
mod fmt;
mod output;
mod prelude;
mod tables;

use clap::{Parser, crate_version};
use tracing_subscriber::EnvFilter;

use crate::{
    cli::{Args, Command, check, rates, run},
    prelude::*,
};

fn main() -> Result {
    let _ = dotenvy::dotenv();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().without_time().compact().with_env_filter(filter).init();
    info!(version = crate_version!(), "starting…");

    match Args::parse().command {
        Command::Run(args) => run(&args)?,
        Command::Check(args) => check(&args)?,
        Command::Rates(args) => rates(&args)?,
    }

    info!("done!");
    Ok(())
}
