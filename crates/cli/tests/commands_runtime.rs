use blocks_cli::commands::render;
use serde_json::Value;

#[test]
fn render_counter_emits_message_blocks() {
    let result = render::run("counter", false);
    assert_eq!(result.exit_code, 0, "counter demo should render: {}", result.output);

    let payload: Value = serde_json::from_str(&result.output).expect("JSON output");
    let blocks = payload.as_array().expect("message demos emit a block array");
    assert_eq!(blocks[0]["type"], "header");
    assert_eq!(blocks[2]["type"], "actions");
    assert_eq!(blocks[2]["elements"][0]["type"], "button");
}

#[test]
fn render_approval_emits_a_modal_view() {
    let result = render::run("approval", true);
    assert_eq!(result.exit_code, 0, "approval demo should render: {}", result.output);

    let payload: Value = serde_json::from_str(&result.output).expect("JSON output");
    assert_eq!(payload["type"], "modal");
    assert_eq!(payload["callback_id"], "approval");
    assert_eq!(payload["submit"]["text"], "Request");
    assert!(payload["blocks"]
        .as_array()
        .expect("view blocks")
        .iter()
        .any(|block| block["type"] == "input"));
}

#[test]
fn render_unknown_demo_fails_with_guidance() {
    let result = render::run("nonesuch", false);
    assert_eq!(result.exit_code, 2);
    assert!(result.output.contains("unknown demo"));
    assert!(result.output.contains("counter"));
}
