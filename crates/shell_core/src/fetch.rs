use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client, RequestBuilder, StatusCode};
use shared::{
    domain::Mode,
    protocol::{
        TurboResponse, MODE_HEADER, REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE, STATUS_HEADER,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::error::FetchError;

/// Ordered form fields, posted urlencoded.
pub type FormData = Vec<(String, String)>;

/// Issues protocol-aware requests on behalf of a navigation controller.
///
/// HTTP-level failures are folded into [`TurboResponse`] variants; only
/// transport failures and undecodable protocol bodies come back as `Err`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, path: &str, mode: Mode) -> Result<TurboResponse, FetchError>;
    async fn submit(
        &self,
        path: &str,
        form: &FormData,
        mode: Mode,
    ) -> Result<TurboResponse, FetchError>;
}

/// Decides the response variant from the status line and headers alone.
///
/// Returns `None` when the body has to be parsed as a turbo response.
pub fn classify_head(status: StatusCode, headers: &HeaderMap) -> Option<TurboResponse> {
    // Error pages are frequently not JSON, so never look at the body.
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        return Some(TurboResponse::ServerError);
    }

    if !headers.contains_key(STATUS_HEADER) {
        warn!(
            %status,
            "turbo: a non-turbo response was returned from the server; did you forget to add the 'download' attribute to a link?"
        );
        return Some(TurboResponse::LoadIt);
    }

    None
}

pub fn classify_response(
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<TurboResponse, FetchError> {
    match classify_head(status, headers) {
        Some(response) => Ok(response),
        None => Ok(TurboResponse::from_slice(body)?),
    }
}

pub struct HttpFetcher {
    http: Client,
    base_url: Url,
}

impl HttpFetcher {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url).map_err(|source| FetchError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self::with_client(Client::new(), base_url))
    }

    pub fn with_client(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    fn resolve(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path)
            .map_err(|source| FetchError::InvalidUrl {
                url: path.to_string(),
                source,
            })
    }

    async fn dispatch(
        &self,
        request: RequestBuilder,
        mode: Mode,
    ) -> Result<TurboResponse, FetchError> {
        let response = request
            .header(REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE)
            .header(MODE_HEADER, mode.as_str())
            .send()
            .await?;

        let status = response.status();
        if let Some(fallback) = classify_head(status, response.headers()) {
            debug!(%status, fallback = fallback.status(), "turbo: response classified without body");
            return Ok(fallback);
        }

        let body = response.bytes().await?;
        Ok(TurboResponse::from_slice(&body)?)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, path: &str, mode: Mode) -> Result<TurboResponse, FetchError> {
        let url = self.resolve(path)?;
        self.dispatch(self.http.get(url), mode).await
    }

    async fn submit(
        &self,
        path: &str,
        form: &FormData,
        mode: Mode,
    ) -> Result<TurboResponse, FetchError> {
        let url = self.resolve(path)?;
        self.dispatch(self.http.post(url).form(form), mode).await
    }
}

#[cfg(test)]
#[path = "tests/fetch_tests.rs"]
mod tests;
