use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::{mpsc, oneshot};
use url::Url;

use crate::{
    error::FetchError,
    fetch::{FormData, Fetcher},
    frame::{Frame, FrameIds},
    host::HeadlessBrowser,
    navigation::{ControllerDeps, NavigationController},
};
use shared::{domain::Mode, protocol::TurboResponse};

pub(crate) const ORIGIN: &str = "http://admin.test";

enum Reply {
    Ready(Result<TurboResponse, FetchError>),
    Gated(oneshot::Receiver<TurboResponse>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub mode: Mode,
    pub form: Option<FormData>,
}

/// Fetcher whose replies are scripted per path. Gated replies let a test
/// decide the order in which in-flight requests complete.
pub(crate) struct ScriptedFetcher {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    started: mpsc::UnboundedSender<String>,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (started, started_rx) = mpsc::unbounded_channel();
        let fetcher = Arc::new(Self {
            replies: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            started,
        });
        (fetcher, started_rx)
    }

    fn script(&self, path: &str, reply: Reply) {
        self.replies
            .lock()
            .expect("replies lock")
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
    }

    pub(crate) fn respond(&self, path: &str, response: TurboResponse) {
        self.script(path, Reply::Ready(Ok(response)));
    }

    pub(crate) fn fail(&self, path: &str) {
        self.script(
            path,
            Reply::Ready(Err(FetchError::InvalidUrl {
                url: path.to_string(),
                source: url::ParseError::EmptyHost,
            })),
        );
    }

    pub(crate) fn gate(&self, path: &str) -> oneshot::Sender<TurboResponse> {
        let (tx, rx) = oneshot::channel();
        self.script(path, Reply::Gated(rx));
        tx
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    async fn reply(&self, request: RecordedRequest) -> Result<TurboResponse, FetchError> {
        let path = request.path.clone();
        let reply = self
            .replies
            .lock()
            .expect("replies lock")
            .get_mut(&path)
            .and_then(VecDeque::pop_front);
        self.requests.lock().expect("requests lock").push(request);
        let _ = self.started.send(path.clone());

        match reply {
            Some(Reply::Ready(result)) => result,
            Some(Reply::Gated(rx)) => Ok(rx.await.expect("gate sender dropped")),
            None => panic!("unscripted request for {path}"),
        }
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn get(&self, path: &str, mode: Mode) -> Result<TurboResponse, FetchError> {
        self.reply(RecordedRequest {
            method: "GET",
            path: path.to_string(),
            mode,
            form: None,
        })
        .await
    }

    async fn submit(
        &self,
        path: &str,
        form: &FormData,
        mode: Mode,
    ) -> Result<TurboResponse, FetchError> {
        self.reply(RecordedRequest {
            method: "POST",
            path: path.to_string(),
            mode,
            form: Some(form.clone()),
        })
        .await
    }
}

pub(crate) fn headless() -> Arc<HeadlessBrowser> {
    Arc::new(HeadlessBrowser::new(
        Url::parse(ORIGIN).expect("origin"),
        "/admin/",
    ))
}

pub(crate) fn deps(fetcher: &Arc<ScriptedFetcher>, host: &Arc<HeadlessBrowser>) -> ControllerDeps {
    ControllerDeps::new(fetcher.clone(), host.clone()).with_frame_ids(FrameIds::new())
}

pub(crate) fn render(mode: Mode, view: &str) -> TurboResponse {
    TurboResponse::render(
        mode,
        format!("{view} title"),
        view,
        json!({ "view": view }),
        Vec::new(),
    )
}

pub(crate) fn record_frames(controller: &NavigationController) -> Arc<Mutex<Vec<Frame>>> {
    let frames = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&frames);
    controller.add_navigation_listener(move |frame| {
        sink.lock().expect("frames lock").push(frame.clone());
    });
    frames
}

pub(crate) fn views(frames: &Mutex<Vec<Frame>>) -> Vec<String> {
    frames
        .lock()
        .expect("frames lock")
        .iter()
        .filter_map(|frame| frame.view().map(str::to_string))
        .collect()
}
