use serde::{Deserialize, Serialize};

use crate::{
    domain::{MessageLevel, Mode},
    error::ProtocolError,
};

// Header names are lowercase so they can be used with `HeaderName::from_static`.

/// Request header marking a fetch as issued by the shell.
pub const REQUESTED_WITH_HEADER: &str = "x-requested-with";
pub const REQUESTED_WITH_VALUE: &str = "WagtailTurbo";
/// Carries the issuing controller's mode on requests, and the mode the
/// server rendered for on responses.
pub const MODE_HEADER: &str = "x-wagtailturbo-mode";
/// Response header that marks a body as a turbo response. Its value is the
/// response status.
pub const STATUS_HEADER: &str = "x-wagtailturbo-status";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageBody {
    Text(String),
    Html(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub level: MessageLevel,
    #[serde(flatten)]
    pub body: MessageBody,
}

impl Message {
    pub fn text(level: MessageLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            body: MessageBody::Text(text.into()),
        }
    }

    pub fn html(level: MessageLevel, html: impl Into<String>) -> Self {
        Self {
            level,
            body: MessageBody::Html(html.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderResponse {
    pub mode: Mode,
    pub title: String,
    pub view: String,
    #[serde(default)]
    pub context: serde_json::Value,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum TurboResponse {
    LoadIt,
    Redirect { path: String },
    Render(RenderResponse),
    CloseModal,
    ServerError,
    NotFound,
    PermissionDenied,
}

impl TurboResponse {
    pub fn render(
        mode: Mode,
        title: impl Into<String>,
        view: impl Into<String>,
        context: serde_json::Value,
        messages: Vec<Message>,
    ) -> Self {
        TurboResponse::Render(RenderResponse {
            mode,
            title: title.into(),
            view: view.into(),
            context,
            messages,
        })
    }

    pub fn redirect(path: impl Into<String>) -> Self {
        TurboResponse::Redirect { path: path.into() }
    }

    pub fn status(&self) -> &'static str {
        match self {
            TurboResponse::LoadIt => "load-it",
            TurboResponse::Redirect { .. } => "redirect",
            TurboResponse::Render(_) => "render",
            TurboResponse::CloseModal => "close-modal",
            TurboResponse::ServerError => "server-error",
            TurboResponse::NotFound => "not-found",
            TurboResponse::PermissionDenied => "permission-denied",
        }
    }

    pub fn from_slice(body: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(body)?)
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
