use clap::Parser;

use crate::{api::cbs, cli::http::HttpArgs, prelude::*, tables::build_rates_table};

#[derive(Parser)]
pub struct RatesArgs {
    #[clap(flatten)]
    http: HttpArgs,
}

pub fn rates(args: &RatesArgs) -> Result {
    let tax_table = cbs::Api::new(&args.http.agent()).get_tax_table()?;
    println!("{}", build_rates_table(&tax_table));
    Ok(())
}
