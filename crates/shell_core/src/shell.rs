//! Page-level orchestration: the page controller, at most one modal, and the
//! message surface shown above the current frame.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use shared::{
    domain::{FrameId, MessageLevel},
    protocol::{Message, TurboResponse},
};
use tracing::debug;

use crate::{
    error::NavigationError,
    fetch::FormData,
    frame::Frame,
    host::BrowserHost,
    navigation::{ControllerDeps, NavigationController},
};

pub const SERVER_ERROR_MESSAGE: &str = "A server error occurred. Please try again later.";

pub type CloseCallback = Box<dyn FnOnce() + Send>;

struct OpenModal {
    controller: Arc<NavigationController>,
    on_close: Option<CloseCallback>,
}

#[derive(Default)]
struct ShellState {
    local_messages: HashMap<FrameId, Vec<Message>>,
    modal: Option<OpenModal>,
}

fn lock(state: &Mutex<ShellState>) -> MutexGuard<'_, ShellState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn push_local_message(state: &Mutex<ShellState>, frame_id: FrameId, message: Message) {
    lock(state)
        .local_messages
        .entry(frame_id)
        .or_default()
        .push(message);
}

/// Closes the open modal, but only if it is `expected` (or any modal when
/// `expected` is `None`). The close callback runs after the lock is released.
fn close_modal_if(state: &Mutex<ShellState>, expected: Option<&Weak<NavigationController>>) {
    let closed = {
        let mut guard = lock(state);
        let matches = match (&guard.modal, expected) {
            (Some(open), Some(expected)) => {
                std::ptr::eq(Arc::as_ptr(&open.controller), expected.as_ptr())
            }
            (Some(_), None) => true,
            (None, _) => false,
        };
        if matches {
            guard.modal.take()
        } else {
            None
        }
    };

    if let Some(mut closed) = closed {
        debug!(frame_id = %closed.controller.current_frame_id(), "shell: modal closed");
        if let Some(on_close) = closed.on_close.take() {
            on_close();
        }
    }
}

pub struct Shell {
    page: Arc<NavigationController>,
    host: Arc<dyn BrowserHost>,
    state: Arc<Mutex<ShellState>>,
}

impl Shell {
    pub fn new(deps: ControllerDeps) -> Self {
        let host = Arc::clone(&deps.host);
        let page = NavigationController::browser(deps);
        let state = Arc::new(Mutex::new(ShellState::default()));

        {
            let state = Arc::downgrade(&state);
            let page_ref = Arc::downgrade(&page);
            page.add_server_error_listener(move || {
                let (Some(state), Some(page)) = (state.upgrade(), page_ref.upgrade()) else {
                    return;
                };
                push_local_message(
                    &state,
                    page.current_frame_id(),
                    Message::text(MessageLevel::Error, SERVER_ERROR_MESSAGE),
                );
            });
        }

        {
            // Navigating the page dismisses whatever modal is open.
            let state = Arc::downgrade(&state);
            page.add_navigation_listener(move |_frame| {
                if let Some(state) = state.upgrade() {
                    close_modal_if(&state, None);
                }
            });
        }

        Self { page, host, state }
    }

    pub fn page(&self) -> &Arc<NavigationController> {
        &self.page
    }

    /// Applies the response the server embedded in the initial document.
    pub async fn bootstrap(&self, initial: TurboResponse) -> Result<(), NavigationError> {
        let path = self.host.current_path();
        self.page.handle_response(initial, &path, false).await
    }

    pub async fn navigate(&self, url: &str) -> Result<(), NavigationError> {
        self.page.navigate(url, true).await
    }

    pub async fn submit_form(&self, url: &str, form: &FormData) -> Result<(), NavigationError> {
        self.page.submit_form(url, form).await
    }

    /// Back/forward navigation: the browser already moved, so no new entry.
    pub async fn pop_state(&self, path: &str) -> Result<(), NavigationError> {
        self.page.navigate(path, false).await
    }

    pub fn push_message(&self, frame_id: FrameId, message: Message) {
        push_local_message(&self.state, frame_id, message);
    }

    /// Server messages of the current page frame followed by messages raised
    /// locally against it.
    pub fn frame_messages(&self) -> Vec<Message> {
        let frame = self.page.current_frame();
        let mut messages = frame.server_messages;
        if let Some(local) = lock(&self.state).local_messages.get(&frame.id) {
            messages.extend(local.iter().cloned());
        }
        messages
    }

    /// Opens `path` in a fresh modal controller nested under the page. Any
    /// modal already open is closed first.
    pub async fn open_modal(
        &self,
        path: &str,
        on_close: Option<CloseCallback>,
    ) -> Result<Arc<NavigationController>, NavigationError> {
        let modal = self.page.spawn_modal();

        {
            let state = Arc::downgrade(&self.state);
            let this_modal = Arc::downgrade(&modal);
            modal.add_close_listener(move || {
                if let Some(state) = state.upgrade() {
                    close_modal_if(&state, Some(&this_modal));
                }
            });
        }

        close_modal_if(&self.state, None);
        lock(&self.state).modal = Some(OpenModal {
            controller: Arc::clone(&modal),
            on_close,
        });

        modal.navigate(path, true).await?;
        Ok(modal)
    }

    pub fn close_modal(&self) {
        close_modal_if(&self.state, None);
    }

    pub fn modal(&self) -> Option<Arc<NavigationController>> {
        lock(&self.state)
            .modal
            .as_ref()
            .map(|open| Arc::clone(&open.controller))
    }

    /// The modal's frame, once it has something to show.
    pub fn modal_frame(&self) -> Option<Frame> {
        self.modal()
            .map(|modal| modal.current_frame())
            .filter(|frame| !frame.is_loading())
    }
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
