use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::info;
use url::Url;

/// The browser facilities a controller touches. Only browser-mode
/// controllers set the title or write history.
pub trait BrowserHost: Send + Sync {
    /// Origin that origin-relative URLs resolve against.
    fn origin(&self) -> Url;
    /// Path and query of the location currently displayed.
    fn current_path(&self) -> String;
    /// Full page navigation, leaving the shell.
    fn assign_location(&self, url: &str);
    fn set_document_title(&self, title: &str);
    fn push_history(&self, path: &str);
    fn replace_history(&self, path: &str);
}

struct HeadlessState {
    title: String,
    entries: Vec<String>,
    index: usize,
    assigned: Vec<String>,
}

/// In-memory browser used by the CLI and by tests.
pub struct HeadlessBrowser {
    origin: Url,
    state: Mutex<HeadlessState>,
}

impl HeadlessBrowser {
    pub fn new(origin: Url, initial_path: impl Into<String>) -> Self {
        Self {
            origin,
            state: Mutex::new(HeadlessState {
                title: String::new(),
                entries: vec![initial_path.into()],
                index: 0,
                assigned: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn title(&self) -> String {
        self.lock().title.clone()
    }

    pub fn history(&self) -> Vec<String> {
        self.lock().entries.clone()
    }

    /// Full page navigations requested so far, oldest first.
    pub fn assigned_locations(&self) -> Vec<String> {
        self.lock().assigned.clone()
    }

    /// Steps back one history entry and returns the path a popstate event
    /// would carry.
    pub fn back(&self) -> Option<String> {
        let mut state = self.lock();
        if state.index == 0 {
            return None;
        }
        state.index -= 1;
        Some(state.entries[state.index].clone())
    }

    pub fn forward(&self) -> Option<String> {
        let mut state = self.lock();
        if state.index + 1 >= state.entries.len() {
            return None;
        }
        state.index += 1;
        Some(state.entries[state.index].clone())
    }
}

impl BrowserHost for HeadlessBrowser {
    fn origin(&self) -> Url {
        self.origin.clone()
    }

    fn current_path(&self) -> String {
        let state = self.lock();
        state.entries[state.index].clone()
    }

    fn assign_location(&self, url: &str) {
        info!(url, "headless: full page navigation");
        self.lock().assigned.push(url.to_string());
    }

    fn set_document_title(&self, title: &str) {
        self.lock().title = title.to_string();
    }

    fn push_history(&self, path: &str) {
        let mut state = self.lock();
        let keep = state.index + 1;
        state.entries.truncate(keep);
        state.entries.push(path.to_string());
        state.index = keep;
    }

    fn replace_history(&self, path: &str) {
        let mut state = self.lock();
        let index = state.index;
        state.entries[index] = path.to_string();
    }
}
