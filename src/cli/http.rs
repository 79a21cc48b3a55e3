use clap::Parser;
use ureq::Agent;

use crate::api;

#[derive(Parser)]
pub struct HttpArgs {
    /// Timeout of a single HTTP request.
    #[clap(long = "http-timeout", env = "HTTP_TIMEOUT", default_value = "30s")]
    timeout: humantime::Duration,
}

impl HttpArgs {
    pub fn agent(&self) -> Agent {
        api::new_agent(self.timeout.into())
    }
}
