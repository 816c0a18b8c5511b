use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unknown navigation mode '{0}'")]
    UnknownMode(String),
    #[error("malformed turbo response body: {0}")]
    MalformedBody(#[from] serde_json::Error),
}
