use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid request url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("undecodable turbo response: {0}")]
    Decode(#[from] shared::error::ProtocolError),
}

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("cannot navigate to '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
