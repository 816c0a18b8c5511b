use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, OnceLock,
};

use serde_json::Value;
use shared::{domain::FrameId, protocol::Message};

pub const LOADING_TITLE: &str = "Loading";

/// What a frame displays. `Loading` is the placeholder a controller starts
/// with before any response has been applied.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameContent {
    Loading,
    Rendered { view: String, context: Value },
}

/// One unit of navigated state.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub id: FrameId,
    pub path: String,
    pub title: String,
    pub content: FrameContent,
    pub server_messages: Vec<Message>,
    pub push_state: bool,
}

impl Frame {
    pub(crate) fn loading(id: FrameId, path: String) -> Self {
        Self {
            id,
            path,
            title: LOADING_TITLE.to_string(),
            content: FrameContent::Loading,
            server_messages: Vec::new(),
            push_state: false,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.content, FrameContent::Loading)
    }

    pub fn view(&self) -> Option<&str> {
        match &self.content {
            FrameContent::Loading => None,
            FrameContent::Rendered { view, .. } => Some(view),
        }
    }

    pub fn context(&self) -> Option<&Value> {
        match &self.content {
            FrameContent::Loading => None,
            FrameContent::Rendered { context, .. } => Some(context),
        }
    }
}

/// Monotonic frame id source shared by every controller that should draw
/// from the same sequence.
///
/// Clones share the counter. [`FrameIds::global`] is the process-wide
/// sequence; tests create their own with [`FrameIds::new`].
#[derive(Debug, Clone)]
pub struct FrameIds {
    last: Arc<AtomicU64>,
}

impl FrameIds {
    pub fn new() -> Self {
        Self {
            last: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn global() -> Self {
        static GLOBAL: OnceLock<FrameIds> = OnceLock::new();
        GLOBAL.get_or_init(FrameIds::new).clone()
    }

    pub fn next_id(&self) -> FrameId {
        FrameId(self.last.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

impl Default for FrameIds {
    fn default() -> Self {
        Self::new()
    }
}
