//! Navigation core for a server-driven admin shell.
//!
//! A [`NavigationController`] owns the frame shown on one surface (the page,
//! or a modal nested under it), sends protocol-aware fetches through a
//! [`Fetcher`], and applies the [`TurboResponse`] that comes back in the
//! order requests were dispatched.

pub mod error;
pub mod fetch;
pub mod frame;
pub mod host;
pub mod listeners;
pub mod navigation;
pub mod shell;
pub mod views;

pub use error::{FetchError, NavigationError};
pub use fetch::{classify_response, Fetcher, FormData, HttpFetcher};
pub use frame::{Frame, FrameContent, FrameIds};
pub use host::{BrowserHost, HeadlessBrowser};
pub use listeners::ListenerHandle;
pub use navigation::{
    ControllerConfig, ControllerDeps, ErrorResponsePolicy, NavigationController,
};
pub use shared::{
    domain::{FrameId, MessageLevel, Mode},
    protocol::{Message, MessageBody, RenderResponse, TurboResponse},
};
pub use shell::Shell;
pub use views::ViewRegistry;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
