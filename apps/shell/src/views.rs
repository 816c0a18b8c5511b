use serde_json::Value;
use shell_core::{Frame, Mode, ViewRegistry};

fn excerpt(html: &str, limit: usize) -> String {
    let flat: String = html.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}

fn page_rows(context: Option<&Value>) -> String {
    let Some(pages) = context.and_then(|context| context["pages"].as_array()) else {
        return "  (no pages)".to_string();
    };
    pages
        .iter()
        .map(|page| format!("  #{} {}", page["id"], page["title"].as_str().unwrap_or("?")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text renderers for the views the demo admin produces.
pub fn terminal_views() -> ViewRegistry {
    ViewRegistry::new()
        .register("iframe", |frame: &Frame, mode: Mode| {
            let html = frame
                .context()
                .and_then(|context| context["html"].as_str())
                .unwrap_or_default();
            format!("[{mode}] {}\n  {}", frame.title, excerpt(html, 120))
        })
        .register("page-explorer", |frame: &Frame, mode: Mode| {
            format!("[{mode}] {}\n{}", frame.title, page_rows(frame.context()))
        })
        .register("page-editor", |frame: &Frame, mode: Mode| {
            let page = frame.context().map(|context| &context["page"]);
            format!(
                "[{mode}] {}\n  id={}",
                frame.title,
                page.map(|page| page["id"].to_string()).unwrap_or_default()
            )
        })
        .register("not-found", |frame: &Frame, mode: Mode| {
            format!("[{mode}] {}: {}", frame.title, frame.path)
        })
        .register("permission-denied", |frame: &Frame, mode: Mode| {
            format!("[{mode}] {}: {}", frame.title, frame.path)
        })
        .with_fallback(|frame: &Frame, mode: Mode| {
            format!(
                "[{mode}] {} (view '{}' has no terminal renderer)",
                frame.title,
                frame.view().unwrap_or_default()
            )
        })
}

#[cfg(test)]
#[path = "tests/views_tests.rs"]
mod tests;
