use thiserror::Error;

/// Failure while talking to the market-data API.
///
/// Every variant is transient from the caller's point of view: the affected
/// unit of work is skipped and retried on a later cycle.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream rejected request (status {status}): {message}")]
    Upstream { status: String, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
