use std::time::Duration;

use serde::de::DeserializeOwned;
use ureq::Agent;

use crate::{error::PipelineError, prelude::*};

/// Full-history responses are large, the default body limit is 10 MiB.
const BODY_LIMIT: u64 = 64 * 1024 * 1024;

pub fn new_agent(timeout: Duration) -> Agent {
    Agent::config_builder().timeout_global(Some(timeout)).build().into()
}

/// Send the GET request and decode the JSON body.
///
/// Transport failures and non-success statuses are fetch errors, an undecodable body is a data format error.
#[instrument(skip_all, fields(provider = provider))]
pub fn get_json<T: DeserializeOwned>(
    agent: &Agent,
    provider: &'static str,
    url: &str,
) -> Result<T, PipelineError> {
    debug!(url, "fetching…");
    let mut response = agent.get(url).call().map_err(|error| PipelineError::fetch(url, error))?;
    response.body_mut().with_config().limit(BODY_LIMIT).read_json::<T>().map_err(
        |error| match error {
            ureq::Error::Json(error) => PipelineError::data_format(provider, error.to_string()),
            error => PipelineError::fetch(url, error),
        },
    )
}
