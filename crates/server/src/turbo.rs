//! Server half of the turbo protocol: reply encoding and the negotiation
//! layer that wraps admin routes.

use std::sync::Arc;

use axum::{
    body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use serde_json::{json, Value};
use shared::{
    domain::Mode,
    protocol::{TurboResponse, MODE_HEADER, REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE, STATUS_HEADER},
};
use tracing::{debug, error};

use crate::AppState;

/// Response extension set by views that may be shown inside a modal.
#[derive(Debug, Clone, Copy)]
pub struct ModalSafe;

/// Response extension that opts a view out of turbo conversion.
#[derive(Debug, Clone, Copy)]
pub struct TurboDisabled;

/// A protocol reply. Every status carries the mode it was produced for.
#[derive(Debug, Clone)]
pub struct TurboReply {
    pub response: TurboResponse,
    pub mode: Mode,
}

impl TurboReply {
    pub fn new(response: TurboResponse) -> Self {
        let mode = match &response {
            TurboResponse::Render(render) => render.mode,
            _ => Mode::Browser,
        };
        Self { response, mode }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        if let TurboResponse::Render(render) = &mut self.response {
            render.mode = mode;
        }
        self.mode = mode;
        self
    }

    pub fn body(&self) -> Value {
        let mut body = serde_json::to_value(&self.response).unwrap_or_else(|error| {
            error!(%error, "failed to encode turbo reply");
            json!({ "status": "server-error" })
        });
        if let Value::Object(fields) = &mut body {
            fields
                .entry("mode")
                .or_insert_with(|| Value::String(self.mode.as_str().to_string()));
        }
        body
    }
}

impl From<TurboResponse> for TurboReply {
    fn from(response: TurboResponse) -> Self {
        Self::new(response)
    }
}

impl IntoResponse for TurboReply {
    fn into_response(self) -> Response {
        let body = self.body().to_string();
        (
            [
                (STATUS_HEADER, self.response.status()),
                (MODE_HEADER, self.mode.as_str()),
                ("cache-control", "no-store"),
                ("content-type", "application/json"),
            ],
            body,
        )
            .into_response()
    }
}

/// What the negotiation layer needs to know about the incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurboRequest {
    /// Issued by the shell rather than a plain browser navigation.
    pub from_shell: bool,
    pub xhr: bool,
    pub mode: Mode,
}

impl TurboRequest {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let requested_with = headers
            .get(REQUESTED_WITH_HEADER)
            .and_then(|value| value.to_str().ok());
        let mode = headers
            .get(MODE_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
            .unwrap_or(Mode::Browser);
        Self {
            from_shell: requested_with == Some(REQUESTED_WITH_VALUE),
            xhr: requested_with == Some("XMLHttpRequest"),
            mode,
        }
    }
}

/// Settings the negotiation layer renders with.
#[derive(Debug, Clone)]
pub struct NegotiateConfig {
    pub site_title: String,
    pub frame_url: String,
    pub max_body_bytes: usize,
}

pub async fn turbo_enable(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let turbo = TurboRequest::from_headers(request.headers());
    let response = next.run(request).await;
    negotiate(&state.negotiate, &turbo, response).await
}

fn is_turbo_response(response: &Response) -> bool {
    response.headers().contains_key(STATUS_HEADER)
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("text/html"))
}

/// Turns a view's response into what the requester can consume.
pub async fn negotiate(config: &NegotiateConfig, request: &TurboRequest, response: Response) -> Response {
    let status = response.status();
    // The shell classifies redirects and server errors itself.
    if matches!(status, StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND) || status.is_server_error() {
        return response;
    }

    let response = if status == StatusCode::OK
        && !is_turbo_response(&response)
        && response.extensions().get::<TurboDisabled>().is_none()
        && !request.xhr
        && is_html(&response)
    {
        match convert_html(config, request, response).await {
            Ok(reply) => reply.into_response(),
            Err(response) => return response,
        }
    } else {
        response
    };

    if request.from_shell {
        if is_turbo_response(&response) {
            return response;
        }
        debug!(%status, "negotiate: response cannot be converted, asking the shell to load it");
        return TurboReply::new(TurboResponse::LoadIt).into_response();
    }

    if is_turbo_response(&response) {
        return bootstrap_page(config, response).await;
    }
    response
}

/// Wraps an HTML page in an `iframe` render.
async fn convert_html(
    config: &NegotiateConfig,
    request: &TurboRequest,
    response: Response,
) -> Result<TurboReply, Response> {
    let modal_safe = response.extensions().get::<ModalSafe>().is_some();
    let html = read_body(config, response).await?;

    let mode = if request.mode == Mode::Modal && modal_safe {
        Mode::Modal
    } else {
        Mode::Browser
    };
    let title = page_title(&html).unwrap_or_else(|| config.site_title.clone());

    Ok(TurboReply::new(TurboResponse::render(
        mode,
        title,
        "iframe",
        json!({ "html": html, "frameUrl": config.frame_url }),
        Vec::new(),
    )))
}

async fn read_body(config: &NegotiateConfig, response: Response) -> Result<String, Response> {
    let bytes = body::to_bytes(response.into_body(), config.max_body_bytes)
        .await
        .map_err(|error| {
            error!(%error, "negotiate: failed to buffer response body");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn page_title(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let start = lower.find("<title>")? + "<title>".len();
    let end = start + lower[start..].find("</title>")?;
    let title = html[start..end].trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// A full HTML document that boots the shell with `response` as its first
/// frame. Served to plain browser requests for turbo content.
async fn bootstrap_page(config: &NegotiateConfig, response: Response) -> Response {
    let data = match read_body(config, response).await {
        Ok(data) => data,
        Err(response) => return response,
    };
    let mut page = Html(render_bootstrap(&config.site_title, &data)).into_response();
    page.headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    page
}

pub fn render_bootstrap(title: &str, data: &str) -> String {
    // Keeps the payload from closing the script element early.
    let data = data.replace("</", "<\\/");
    format!(
        "<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n<div id=\"wagtailturbo-root\"></div>\n<script id=\"wagtailturbo-data\" type=\"application/json\">{data}</script>\n</body>\n</html>\n",
        escape_html(title)
    )
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
#[path = "tests/turbo_tests.rs"]
mod tests;
