use super::*;
use serde_json::json;

#[test]
fn parses_render_with_mixed_messages() {
    let body = json!({
        "status": "render",
        "mode": "modal",
        "title": "Edit page",
        "view": "iframe",
        "context": { "html": "<p>hi</p>" },
        "messages": [
            { "level": "success", "text": "Saved" },
            { "level": "error", "html": "<b>Broken</b>" }
        ]
    });

    let response = TurboResponse::from_slice(body.to_string().as_bytes()).expect("parse");
    let TurboResponse::Render(render) = response else {
        panic!("expected render, got {response:?}");
    };
    assert_eq!(render.mode, Mode::Modal);
    assert_eq!(render.view, "iframe");
    assert_eq!(render.context["html"], "<p>hi</p>");
    assert_eq!(
        render.messages,
        vec![
            Message::text(MessageLevel::Success, "Saved"),
            Message::html(MessageLevel::Error, "<b>Broken</b>"),
        ]
    );
}

#[test]
fn unit_variants_ignore_the_mode_field() {
    let response =
        TurboResponse::from_slice(br#"{"status":"close-modal","mode":"browser"}"#).expect("parse");
    assert_eq!(response, TurboResponse::CloseModal);

    let response = TurboResponse::from_slice(br#"{"status":"permission-denied"}"#).expect("parse");
    assert_eq!(response, TurboResponse::PermissionDenied);
}

#[test]
fn redirect_carries_path() {
    let response =
        TurboResponse::from_slice(br#"{"status":"redirect","path":"/admin/pages/"}"#).expect("parse");
    assert_eq!(response, TurboResponse::redirect("/admin/pages/"));
}

#[test]
fn render_defaults_missing_context_and_messages() {
    let response = TurboResponse::from_slice(
        br#"{"status":"render","mode":"browser","title":"Home","view":"dashboard"}"#,
    )
    .expect("parse");
    let TurboResponse::Render(render) = response else {
        panic!("expected render");
    };
    assert!(render.context.is_null());
    assert!(render.messages.is_empty());
}

#[test]
fn status_matches_serialized_tag() {
    let responses = [
        TurboResponse::LoadIt,
        TurboResponse::redirect("/"),
        TurboResponse::render(Mode::Browser, "t", "v", json!({}), Vec::new()),
        TurboResponse::CloseModal,
        TurboResponse::ServerError,
        TurboResponse::NotFound,
        TurboResponse::PermissionDenied,
    ];
    for response in responses {
        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(value["status"], response.status());
    }
}

#[test]
fn unknown_status_is_malformed() {
    let err = TurboResponse::from_slice(br#"{"status":"teleport"}"#).expect_err("should fail");
    assert!(matches!(err, ProtocolError::MalformedBody(_)));

    let err = TurboResponse::from_slice(b"<html>oops</html>").expect_err("should fail");
    assert!(matches!(err, ProtocolError::MalformedBody(_)));
}

#[test]
fn mode_parses_header_values() {
    assert_eq!("modal".parse::<Mode>().expect("mode"), Mode::Modal);
    assert_eq!(Mode::Browser.to_string(), "browser");
    assert!(matches!(
        "popup".parse::<Mode>(),
        Err(ProtocolError::UnknownMode(value)) if value == "popup"
    ));
}
