use std::path::PathBuf;

use crate::core::month::Month;

/// Pipeline failures that callers may want to tell apart.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Transport failure or a non-success HTTP status.
    #[error("failed to fetch `{url}`")]
    Fetch {
        url: String,

        #[source]
        source: Box<ureq::Error>,
    },

    /// The response could not be resolved into any known shape.
    #[error("unrecognized {provider} response: {reason}")]
    DataFormat { provider: &'static str, reason: String },

    #[error("more than one tax rate for {0}")]
    DuplicateTaxRate(Month),

    #[error("`{}` is not sorted by month: {next} follows {previous}", .path.display())]
    UnsortedDataset { path: PathBuf, previous: Month, next: Month },
}

impl PipelineError {
    pub fn fetch(url: impl Into<String>, source: ureq::Error) -> Self {
        Self::Fetch { url: url.into(), source: Box::new(source) }
    }

    pub fn data_format(provider: &'static str, reason: impl Into<String>) -> Self {
        Self::DataFormat { provider, reason: reason.into() }
    }
}
