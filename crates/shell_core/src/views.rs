use std::{collections::HashMap, sync::Arc};

use shared::domain::Mode;

use crate::frame::Frame;

pub type Renderer = dyn Fn(&Frame, Mode) -> String + Send + Sync;

/// Maps view names to renderers. Frames naming an unregistered view go to
/// the fallback renderer.
pub struct ViewRegistry {
    views: HashMap<String, Arc<Renderer>>,
    fallback: Arc<Renderer>,
    loading: Arc<Renderer>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self {
            views: HashMap::new(),
            fallback: Arc::new(|frame: &Frame, _mode: Mode| {
                format!("unknown view '{}'", frame.view().unwrap_or_default())
            }),
            loading: Arc::new(|_frame: &Frame, _mode: Mode| "Loading...".to_string()),
        }
    }

    pub fn register(
        mut self,
        view: impl Into<String>,
        renderer: impl Fn(&Frame, Mode) -> String + Send + Sync + 'static,
    ) -> Self {
        self.views.insert(view.into(), Arc::new(renderer));
        self
    }

    pub fn with_fallback(
        mut self,
        renderer: impl Fn(&Frame, Mode) -> String + Send + Sync + 'static,
    ) -> Self {
        self.fallback = Arc::new(renderer);
        self
    }

    pub fn with_loading(
        mut self,
        renderer: impl Fn(&Frame, Mode) -> String + Send + Sync + 'static,
    ) -> Self {
        self.loading = Arc::new(renderer);
        self
    }

    pub fn contains(&self, view: &str) -> bool {
        self.views.contains_key(view)
    }

    pub fn render(&self, frame: &Frame, mode: Mode) -> String {
        let renderer = match frame.view() {
            None => &self.loading,
            Some(view) => self.views.get(view).unwrap_or(&self.fallback),
        };
        renderer(frame, mode)
    }
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::new()
    }
}
