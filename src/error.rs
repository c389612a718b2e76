use reqwest::StatusCode;

/// Failure of a single upstream request (chain RPC or subgraph query).
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection refused, timeout, or a chain RPC node answering with a non-2xx status.
    #[error("transport error: {0}")]
    Transport(String),
    /// Upstream answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },
    /// Response body was not the JSON shape we expect.
    #[error("decode error: {0}")]
    Decode(String),
    /// Well-formed response carrying an application-level error or an invalid value.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
