//! Demo admin views. Between them they produce every turbo status, plain
//! HTML pages (modal-safe or not), a server error and a file download.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Extension, Form,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::{
    domain::{MessageLevel, Mode},
    protocol::{Message, TurboResponse},
};
use tracing::info;

use crate::{
    turbo::{ModalSafe, TurboDisabled, TurboReply, TurboRequest},
    AppState,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoPage {
    pub id: u64,
    pub title: String,
}

pub fn seed_pages() -> Vec<DemoPage> {
    vec![
        DemoPage {
            id: 1,
            title: "Home".into(),
        },
        DemoPage {
            id: 2,
            title: "About us".into(),
        },
    ]
}

fn html_page(title: &str, body: &str) -> String {
    format!("<!doctype html><html><head><title>{title}</title></head><body>{body}</body></html>")
}

pub async fn dashboard() -> Html<String> {
    Html(html_page(
        "Dashboard",
        "<h1>Welcome to the admin</h1><a href=\"/admin/pages/\">Pages</a>",
    ))
}

#[derive(Debug, Deserialize)]
pub struct ExplorerQuery {
    created: Option<u64>,
}

pub async fn page_explorer(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExplorerQuery>,
) -> TurboReply {
    let pages = state.pages.read().await;
    let messages = query
        .created
        .and_then(|id| pages.iter().find(|page| page.id == id))
        .map(|page| {
            vec![Message::text(
                MessageLevel::Success,
                format!("Page '{}' created.", page.title),
            )]
        })
        .unwrap_or_default();

    TurboReply::new(TurboResponse::render(
        Mode::Browser,
        "Pages",
        "page-explorer",
        json!({ "pages": *pages }),
        messages,
    ))
}

fn add_page_form(error: Option<&str>) -> String {
    let error = error
        .map(|error| format!("<p class=\"error\">{error}</p>"))
        .unwrap_or_default();
    html_page(
        "Add page",
        &format!(
            "{error}<form method=\"post\" action=\"/admin/pages/add/\"><input name=\"title\"><button>Save</button></form>"
        ),
    )
}

pub async fn add_page_get() -> impl IntoResponse {
    (Extension(ModalSafe), Html(add_page_form(None)))
}

#[derive(Debug, Deserialize)]
pub struct AddPageForm {
    #[serde(default)]
    title: String,
}

pub async fn add_page_post(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<AddPageForm>,
) -> Response {
    let title = form.title.trim();
    if title.is_empty() {
        return (
            Extension(ModalSafe),
            Html(add_page_form(Some("The title field is required."))),
        )
            .into_response();
    }

    let id = {
        let mut pages = state.pages.write().await;
        let id = pages.iter().map(|page| page.id).max().unwrap_or_default() + 1;
        pages.push(DemoPage {
            id,
            title: title.to_string(),
        });
        id
    };
    info!(id, title, "page created");

    match TurboRequest::from_headers(&headers).mode {
        Mode::Modal => TurboReply::new(TurboResponse::CloseModal)
            .with_mode(Mode::Modal)
            .into_response(),
        Mode::Browser => {
            TurboReply::new(TurboResponse::redirect(format!("/admin/pages/?created={id}")))
                .into_response()
        }
    }
}

pub async fn page_editor(State(state): State<Arc<AppState>>, Path(id): Path<u64>) -> TurboReply {
    let pages = state.pages.read().await;
    match pages.iter().find(|page| page.id == id) {
        Some(page) => TurboReply::new(TurboResponse::render(
            Mode::Browser,
            format!("Editing '{}'", page.title),
            "page-editor",
            json!({ "page": page }),
            Vec::new(),
        )),
        None => TurboReply::new(TurboResponse::NotFound),
    }
}

/// Deleting is reserved for superusers, which the demo never has.
pub async fn delete_page(Path(_id): Path<u64>) -> TurboReply {
    TurboReply::new(TurboResponse::PermissionDenied)
}

/// A regular HTML page that is not modal-safe, so modal requests for it
/// come back in browser mode.
pub async fn settings_page() -> Html<String> {
    Html(html_page("Settings", "<h1>Site settings</h1>"))
}

pub async fn legacy_page() -> impl IntoResponse {
    (
        Extension(TurboDisabled),
        Html(html_page("Legacy report", "<h1>Rendered outside the shell</h1>")),
    )
}

pub async fn export_pages(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let pages = state.pages.read().await;
    let mut csv = String::from("id,title\n");
    for page in pages.iter() {
        csv.push_str(&format!("{},{}\n", page.id, page.title));
    }
    (
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"pages.csv\""),
        ],
        csv,
    )
}

pub async fn crash() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(html_page("Server error", "<h1>Server Error (500)</h1>")),
    )
}

#[derive(Debug, Deserialize)]
pub struct TurboInitQuery {
    path: Option<String>,
}

/// Entry point for the shell: redirects it to `path`, or the admin home.
pub async fn turbo_init(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TurboInitQuery>,
) -> TurboReply {
    let path = query
        .path
        .filter(|path| !path.is_empty())
        .unwrap_or_else(|| state.admin_home.clone());
    TurboReply::new(TurboResponse::redirect(path))
}

/// Hosts iframe-rendered pages.
pub async fn turbo_frame() -> impl IntoResponse {
    (
        Extension(TurboDisabled),
        Html(html_page("Frame", "<div id=\"wagtailturbo-frame\"></div>")),
    )
}
