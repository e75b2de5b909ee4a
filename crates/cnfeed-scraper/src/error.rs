use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The `__INITIAL_PROPS__` payload could not be located, or none of the
    /// repair passes produced valid JSON. Terminal for the request.
    #[error("__INITIAL_PROPS__ payload not found or unparseable")]
    PayloadNotFound,

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UpstreamStatus { status: u16, url: String },

    #[error("invalid target URL \"{input}\": {reason}")]
    InvalidTarget { input: String, reason: String },

    #[error("no dealer slug or listing URL supplied")]
    MissingTarget,
}
