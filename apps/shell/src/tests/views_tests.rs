use super::*;
use serde_json::json;
use shell_core::{FrameContent, FrameId};

fn frame_for(title: &str, view: &str, context: Value) -> Frame {
    Frame {
        id: FrameId(7),
        path: "/admin/pages/7/".into(),
        title: title.into(),
        content: FrameContent::Rendered {
            view: view.into(),
            context,
        },
        server_messages: Vec::new(),
        push_state: true,
    }
}

#[test]
fn iframe_view_prints_a_flattened_excerpt() {
    let frame = frame_for(
        "Dashboard",
        "iframe",
        json!({ "html": "<h1>Welcome</h1>\n\n   <p>to the admin</p>" }),
    );
    assert_eq!(
        terminal_views().render(&frame, Mode::Browser),
        "[browser] Dashboard\n  <h1>Welcome</h1> <p>to the admin</p>"
    );
}

#[test]
fn explorer_lists_pages() {
    let frame = frame_for(
        "Pages",
        "page-explorer",
        json!({ "pages": [{ "id": 1, "title": "Home" }] }),
    );
    assert_eq!(
        terminal_views().render(&frame, Mode::Modal),
        "[modal] Pages\n  #1 Home"
    );
}

#[test]
fn unknown_views_use_fallback() {
    let frame = frame_for("Reports", "report-chart", Value::Null);
    assert_eq!(
        terminal_views().render(&frame, Mode::Browser),
        "[browser] Reports (view 'report-chart' has no terminal renderer)"
    );
}

#[test]
fn long_html_is_cut() {
    let html = "x".repeat(300);
    assert_eq!(excerpt(&html, 10), "xxxxxxxxxx...");
}
