//! Error types for the GitHub API boundary.

use remind_core::RemindError;

/// Errors from talking to the GitHub API.
///
/// A malformed payload is treated the same as a transport failure: the
/// current cycle aborts and retries at the next interval.
#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API returned {status} for {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },
    #[error("Unexpected payload shape: {0}")]
    Decode(String),
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl From<GithubError> for RemindError {
    fn from(err: GithubError) -> Self {
        RemindError::Api(err.to_string())
    }
}
