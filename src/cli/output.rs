use std::path::PathBuf;

use clap::{Parser, builder::FalseyValueParser};

use crate::output::Output;

#[derive(Parser)]
pub struct OutputArgs {
    /// Ephemeral deployment: write into the system temporary directory
    /// and copy the artifacts into the public directory.
    #[clap(long, env = "VERCEL", value_parser = FalseyValueParser::new())]
    vercel: bool,

    /// Persistent artifact directory.
    #[clap(long, env = "OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Public directory for the ephemeral deployment.
    #[clap(long, env = "PUBLIC_DIR", default_value = "public/data")]
    public_dir: PathBuf,
}

impl OutputArgs {
    pub fn output(&self) -> Output {
        if self.vercel {
            Output::new(std::env::temp_dir(), Some(self.public_dir.clone()))
        } else {
            Output::new(self.output_dir.clone(), None)
        }
    }
}
