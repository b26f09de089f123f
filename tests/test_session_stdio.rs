mod common;

use common::SessionProcess;
use serde_json::json;

fn layout() -> serde_json::Value {
    json!({
        "type": "layout",
        "sections": [
            { "id": "hero", "top": 0, "height": 800 },
            { "id": "about", "top": 800, "height": 700 },
            { "id": "skills", "top": 1500, "height": 600 },
            { "id": "projects", "top": 2100, "height": 900 },
            { "id": "contact", "top": 3000, "height": 600 }
        ]
    })
}

#[tokio::test]
async fn initial_state_is_first_section() {
    let mut session = SessionProcess::spawn("site.yaml", false);
    let state = session.expect_type("state").await;
    assert_eq!(state["active_section"], "hero");
    assert_eq!(state["menu_open"], false);
    assert!(state["scroll_to"].is_null());

    session.close_stdin();
    assert_eq!(session.wait().await, Some(0));
}

#[tokio::test]
async fn scroll_spy_tracks_biased_offset() {
    let mut session = SessionProcess::spawn("site.yaml", false);
    session.expect_type("state").await;

    let state = session.send_and_expect_state(&layout()).await;
    assert_eq!(state["active_section"], "hero");

    // 750 + bias 100 lands inside "about" (800..1500).
    let state = session
        .send_and_expect_state(&json!({ "type": "scroll", "offset": 750 }))
        .await;
    assert_eq!(state["active_section"], "about");

    let state = session
        .send_and_expect_state(&json!({ "type": "scroll", "offset": 2050 }))
        .await;
    assert_eq!(state["active_section"], "projects");

    // Past the last section nothing matches and the previous answer stays.
    let state = session
        .send_and_expect_state(&json!({ "type": "scroll", "offset": 5000 }))
        .await;
    assert_eq!(state["active_section"], "projects");
}

#[tokio::test]
async fn menu_toggle_and_navigation() {
    let mut session = SessionProcess::spawn("site.yaml", false);
    session.expect_type("state").await;
    session.send_and_expect_state(&layout()).await;

    let state = session
        .send_and_expect_state(&json!({ "type": "toggle_menu" }))
        .await;
    assert_eq!(state["menu_open"], true);

    let state = session
        .send_and_expect_state(&json!({ "type": "navigate", "section": "projects" }))
        .await;
    assert_eq!(state["menu_open"], false, "navigating closes the menu");
    assert_eq!(state["scroll_to"]["section"], "projects");

    let state = session
        .send_and_expect_state(&json!({ "type": "navigate", "section": "blog" }))
        .await;
    assert!(state["scroll_to"].is_null(), "unknown targets do not scroll");
}

#[tokio::test]
async fn cursor_follows_pointer_when_enabled() {
    let mut session = SessionProcess::spawn("site.yaml", false);
    session.expect_type("state").await;

    let state = session
        .send_and_expect_state(&json!({ "type": "pointer_move", "x": 12.5, "y": 40 }))
        .await;
    assert_eq!(state["cursor"]["x"], 12.5);
    assert_eq!(state["cursor"]["y"], 40.0);
}

#[tokio::test]
async fn malformed_input_keeps_session_alive() {
    let mut session = SessionProcess::spawn("site.yaml", false);
    session.expect_type("state").await;

    session.send_line("{not json").await;
    let error = session.expect_type("error").await;
    assert!(error["message"].as_str().unwrap().contains("protocol error"));

    session.send_line(r#"{"type":"wiggle"}"#).await;
    session.expect_type("error").await;

    let state = session
        .send_and_expect_state(&json!({ "type": "toggle_menu" }))
        .await;
    assert_eq!(state["menu_open"], true);
}

#[tokio::test]
async fn teardown_ends_session() {
    let mut session = SessionProcess::spawn("site.yaml", true);
    session.expect_type("state").await;

    session
        .send_and_expect_state(&json!({ "type": "teardown" }))
        .await;
    assert_eq!(session.wait().await, Some(0));
}

#[tokio::test]
async fn typewriter_frames_are_streamed() {
    let mut session = SessionProcess::spawn("site.yaml", true);
    session.expect_type("state").await;

    let mut seen_full = false;
    for _ in 0..50 {
        let frame = session.expect_type("typewriter").await;
        let text = frame["text"].as_str().unwrap();
        assert!("Ada".starts_with(text), "frame text must be a prefix: {text}");
        if text == "Ada" {
            assert_eq!(frame["caret"], true);
            seen_full = true;
            break;
        }
    }
    assert!(seen_full, "typewriter should reach the full name");

    session.close_stdin();
    assert_eq!(session.wait().await, Some(0));
}
