use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook rejected message (status {status}): {body}")]
    Rejected { status: u16, body: String },
}
