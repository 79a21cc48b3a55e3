use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
pub struct ReferenceArgs {
    /// Historical comparison table (TOML), defaults to the built-in one.
    #[clap(long = "reference-table", env = "REFERENCE_TABLE")]
    pub path: Option<PathBuf>,
}
