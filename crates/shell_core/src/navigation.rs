use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use futures::{future::BoxFuture, FutureExt};
use serde_json::Value;
use shared::{
    domain::{FrameId, Mode},
    protocol::{Message, RenderResponse, TurboResponse},
};
use tracing::{debug, error, info, warn};

use crate::{
    error::{FetchError, NavigationError},
    fetch::{FormData, Fetcher},
    frame::{Frame, FrameContent, FrameIds},
    host::BrowserHost,
    listeners::{ListenerHandle, Listeners},
};

pub const NOT_FOUND_VIEW: &str = "not-found";
pub const NOT_FOUND_TITLE: &str = "Page not found";
pub const PERMISSION_DENIED_VIEW: &str = "permission-denied";
pub const PERMISSION_DENIED_TITLE: &str = "Permission denied";

/// How a controller treats the `not-found` and `permission-denied` statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorResponsePolicy {
    /// Push a frame with the reserved error view for the status.
    #[default]
    RenderErrorView,
    /// Fire the server-error listeners, leaving the frame alone.
    NotifyServerError,
    /// Log and drop the response.
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerConfig {
    pub not_found: ErrorResponsePolicy,
    pub permission_denied: ErrorResponsePolicy,
}

/// Collaborators a controller is built with. Modal controllers inherit all
/// of them from their parent.
#[derive(Clone)]
pub struct ControllerDeps {
    pub fetcher: Arc<dyn Fetcher>,
    pub host: Arc<dyn BrowserHost>,
    pub frame_ids: FrameIds,
    pub config: ControllerConfig,
}

impl ControllerDeps {
    pub fn new(fetcher: Arc<dyn Fetcher>, host: Arc<dyn BrowserHost>) -> Self {
        Self {
            fetcher,
            host,
            frame_ids: FrameIds::global(),
            config: ControllerConfig::default(),
        }
    }

    pub fn with_frame_ids(mut self, frame_ids: FrameIds) -> Self {
        self.frame_ids = frame_ids;
        self
    }

    pub fn with_config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }
}

pub type NavigationListener = dyn Fn(&Frame) + Send + Sync;
pub type SignalListener = dyn Fn() + Send + Sync;

struct ControllerState {
    next_fetch_id: u64,
    last_received_fetch_id: u64,
    current_frame: Frame,
}

/// Owns the frame shown on one navigable surface and applies server
/// responses to it in dispatch order.
pub struct NavigationController {
    mode: Mode,
    parent: Option<Weak<NavigationController>>,
    fetcher: Arc<dyn Fetcher>,
    host: Arc<dyn BrowserHost>,
    frame_ids: FrameIds,
    config: ControllerConfig,
    state: Mutex<ControllerState>,
    navigation_listeners: Listeners<NavigationListener>,
    server_error_listeners: Listeners<SignalListener>,
    close_listeners: Listeners<SignalListener>,
}

impl NavigationController {
    pub fn new(
        mode: Mode,
        parent: Option<&Arc<NavigationController>>,
        deps: ControllerDeps,
    ) -> Arc<Self> {
        let current_frame = Frame::loading(deps.frame_ids.next_id(), deps.host.current_path());
        Arc::new(Self {
            mode,
            parent: parent.map(Arc::downgrade),
            fetcher: deps.fetcher,
            host: deps.host,
            frame_ids: deps.frame_ids,
            config: deps.config,
            state: Mutex::new(ControllerState {
                next_fetch_id: 1,
                last_received_fetch_id: 1,
                current_frame,
            }),
            navigation_listeners: Listeners::new(),
            server_error_listeners: Listeners::new(),
            close_listeners: Listeners::new(),
        })
    }

    pub fn browser(deps: ControllerDeps) -> Arc<Self> {
        Self::new(Mode::Browser, None, deps)
    }

    /// Builds a modal controller nested under this one. The child keeps a
    /// weak reference to `self`; `self` keeps nothing.
    pub fn spawn_modal(self: &Arc<Self>) -> Arc<Self> {
        let deps = ControllerDeps {
            fetcher: Arc::clone(&self.fetcher),
            host: Arc::clone(&self.host),
            frame_ids: self.frame_ids.clone(),
            config: self.config,
        };
        Self::new(Mode::Modal, Some(self), deps)
    }

    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn parent(&self) -> Option<Arc<NavigationController>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn config(&self) -> ControllerConfig {
        self.config
    }

    pub fn has_parent(&self) -> bool {
        self.parent().is_some()
    }

    pub fn current_frame(&self) -> Frame {
        self.lock_state().current_frame.clone()
    }

    pub fn current_frame_id(&self) -> FrameId {
        self.lock_state().current_frame.id
    }

    /// Navigates to `url`. Foreign origins leave the shell through a full
    /// page load; everything else is fetched and applied.
    pub async fn navigate(&self, url: &str, push_state: bool) -> Result<(), NavigationError> {
        // `//host` and `/\host` are network-path references, not paths.
        let origin_relative =
            url.starts_with('/') && !url.starts_with("//") && !url.starts_with("/\\");
        let path = if origin_relative {
            url.to_string()
        } else {
            let origin = self.host.origin();
            let resolved = origin
                .join(url)
                .map_err(|source| NavigationError::InvalidUrl {
                    url: url.to_string(),
                    source,
                })?;

            if resolved.origin() != origin.origin() {
                info!(url, "navigation: leaving the shell for a foreign origin");
                self.host.assign_location(url);
                return Ok(());
            }

            match resolved.query() {
                Some(query) => format!("{}?{query}", resolved.path()),
                None => resolved.path().to_string(),
            }
        };

        let fetch = self.fetcher.get(&path, self.mode);
        self.sequenced(fetch, &path, push_state).await
    }

    pub async fn submit_form(&self, url: &str, form: &FormData) -> Result<(), NavigationError> {
        let fetch = self.fetcher.submit(url, form, self.mode);
        self.sequenced(fetch, url, true).await
    }

    /// Runs `fetch` under a sequence number taken before the request goes
    /// out. A response is dropped when a later-dispatched one has already
    /// been applied.
    async fn sequenced<F>(&self, fetch: F, path: &str, push_state: bool) -> Result<(), NavigationError>
    where
        F: Future<Output = Result<TurboResponse, FetchError>>,
    {
        let fetch_id = {
            let mut state = self.lock_state();
            state.next_fetch_id += 1;
            state.next_fetch_id
        };

        let response = fetch.await?;

        {
            let mut state = self.lock_state();
            if fetch_id < state.last_received_fetch_id {
                debug!(
                    fetch_id,
                    last_received = state.last_received_fetch_id,
                    path,
                    status = response.status(),
                    "navigation: discarding superseded response"
                );
                return Ok(());
            }
            state.last_received_fetch_id = fetch_id;
        }

        self.respond(response, path, push_state, Some(fetch_id)).await
    }

    /// Interprets one response for `path`.
    pub fn handle_response<'a>(
        &'a self,
        response: TurboResponse,
        path: &'a str,
        push_state: bool,
    ) -> BoxFuture<'a, Result<(), NavigationError>> {
        self.respond(response, path, push_state, None)
    }

    /// `fetch_id` is the sequence number of the fetch that produced
    /// `response`, if any. It is checked again when a frame is installed.
    fn respond<'a>(
        &'a self,
        response: TurboResponse,
        path: &'a str,
        push_state: bool,
        fetch_id: Option<u64>,
    ) -> BoxFuture<'a, Result<(), NavigationError>> {
        async move {
            match response {
                TurboResponse::LoadIt => match self.mode {
                    Mode::Browser => self.host.assign_location(path),
                    // A full page load cannot happen inside a modal.
                    Mode::Modal if self.has_parent() => {
                        return self.escalate(path, TurboResponse::LoadIt).await;
                    }
                    Mode::Modal => {
                        error!(path, "navigation: unable to handle a 'load-it' response here");
                    }
                },
                TurboResponse::Redirect { path: target } => {
                    return self.navigate(&target, true).await;
                }
                TurboResponse::Render(render) => {
                    if self.mode == Mode::Modal && render.mode != Mode::Modal {
                        if self.has_parent() {
                            return self.escalate(path, TurboResponse::Render(render)).await;
                        }
                        warn!(
                            path,
                            view = %render.view,
                            "navigation: response cannot be rendered in a modal and there is no parent to escalate to"
                        );
                        return Ok(());
                    }
                    self.apply_render(render, path, push_state, fetch_id);
                }
                TurboResponse::CloseModal => self.notify(&self.close_listeners),
                TurboResponse::ServerError => self.notify(&self.server_error_listeners),
                TurboResponse::NotFound => self.apply_error_policy(
                    self.config.not_found,
                    NOT_FOUND_VIEW,
                    NOT_FOUND_TITLE,
                    path,
                    push_state,
                    fetch_id,
                ),
                TurboResponse::PermissionDenied => self.apply_error_policy(
                    self.config.permission_denied,
                    PERMISSION_DENIED_VIEW,
                    PERMISSION_DENIED_TITLE,
                    path,
                    push_state,
                    fetch_id,
                ),
            }
            Ok(())
        }
        .boxed()
    }

    /// Hands a response this controller cannot render to its parent.
    pub async fn escalate(&self, path: &str, response: TurboResponse) -> Result<(), NavigationError> {
        let Some(parent) = self.parent() else {
            warn!(
                path,
                status = response.status(),
                "navigation: no parent controller to escalate to"
            );
            return Ok(());
        };
        debug!(path, status = response.status(), "navigation: escalating to parent");
        parent.handle_response(response, path, true).await
    }

    fn apply_render(
        &self,
        render: RenderResponse,
        path: &str,
        push_state: bool,
        fetch_id: Option<u64>,
    ) {
        let RenderResponse {
            title,
            view,
            context,
            messages,
            ..
        } = render;
        let frame = self.rendered_frame(path, title, view, context, messages, push_state);
        self.install_frame(frame, fetch_id);
    }

    fn apply_error_policy(
        &self,
        policy: ErrorResponsePolicy,
        view: &str,
        title: &str,
        path: &str,
        push_state: bool,
        fetch_id: Option<u64>,
    ) {
        match policy {
            ErrorResponsePolicy::RenderErrorView => {
                let frame =
                    self.rendered_frame(path, title, view, Value::Null, Vec::new(), push_state);
                self.install_frame(frame, fetch_id);
            }
            ErrorResponsePolicy::NotifyServerError => self.notify(&self.server_error_listeners),
            ErrorResponsePolicy::Ignore => {
                info!(path, view, "navigation: ignoring error response");
            }
        }
    }

    fn notify(&self, listeners: &Listeners<SignalListener>) {
        for listener in listeners.snapshot() {
            listener();
        }
    }

    /// Replaces the current frame and tells navigation listeners about it.
    pub fn push_frame(
        &self,
        path: impl Into<String>,
        title: impl Into<String>,
        view: impl Into<String>,
        context: Value,
        server_messages: Vec<Message>,
        push_state: bool,
    ) -> FrameId {
        let frame = self.rendered_frame(path, title, view, context, server_messages, push_state);
        let id = frame.id;
        self.install_frame(frame, None);
        id
    }

    fn rendered_frame(
        &self,
        path: impl Into<String>,
        title: impl Into<String>,
        view: impl Into<String>,
        context: Value,
        server_messages: Vec<Message>,
        push_state: bool,
    ) -> Frame {
        Frame {
            id: self.frame_ids.next_id(),
            path: path.into(),
            title: title.into(),
            content: FrameContent::Rendered {
                view: view.into(),
                context,
            },
            server_messages,
            push_state,
        }
    }

    /// Makes `frame` current unless a fetch dispatched after `fetch_id` has
    /// been received in the meantime. Check and swap share one lock.
    fn install_frame(&self, frame: Frame, fetch_id: Option<u64>) {
        {
            let mut state = self.lock_state();
            if let Some(fetch_id) = fetch_id {
                if fetch_id < state.last_received_fetch_id {
                    debug!(
                        fetch_id,
                        last_received = state.last_received_fetch_id,
                        path = %frame.path,
                        "navigation: discarding frame superseded while applying"
                    );
                    return;
                }
            }
            state.current_frame = frame.clone();
        }

        if self.mode == Mode::Browser {
            self.host.set_document_title(&frame.title);
            if frame.push_state {
                self.host.push_history(&frame.path);
            }
        }

        for listener in self.navigation_listeners.snapshot() {
            listener(&frame);
        }
    }

    /// Corrects the path of frame `frame_id` if it is still current.
    /// Callbacks from superseded frames are ignored.
    pub fn replace_path(&self, frame_id: FrameId, path: impl Into<String>) {
        let replaced = {
            let mut state = self.lock_state();
            if state.current_frame.id != frame_id {
                debug!(%frame_id, current = %state.current_frame.id, "navigation: stale replace_path");
                return;
            }
            state.current_frame.path = path.into();
            state.current_frame.clone()
        };

        if self.mode == Mode::Browser && replaced.push_state {
            self.host.replace_history(&replaced.path);
        }
    }

    pub fn add_navigation_listener(
        &self,
        listener: impl Fn(&Frame) + Send + Sync + 'static,
    ) -> ListenerHandle {
        self.navigation_listeners.subscribe(Arc::new(listener))
    }

    pub fn remove_navigation_listener(&self, handle: ListenerHandle) -> bool {
        self.navigation_listeners.unsubscribe(handle)
    }

    pub fn add_server_error_listener(
        &self,
        listener: impl Fn() + Send + Sync + 'static,
    ) -> ListenerHandle {
        self.server_error_listeners.subscribe(Arc::new(listener))
    }

    pub fn remove_server_error_listener(&self, handle: ListenerHandle) -> bool {
        self.server_error_listeners.unsubscribe(handle)
    }

    pub fn add_close_listener(&self, listener: impl Fn() + Send + Sync + 'static) -> ListenerHandle {
        self.close_listeners.subscribe(Arc::new(listener))
    }

    pub fn remove_close_listener(&self, handle: ListenerHandle) -> bool {
        self.close_listeners.unsubscribe(handle)
    }
}

#[cfg(test)]
#[path = "tests/navigation_tests.rs"]
mod tests;
