use ruleflow::config::load_dialogue_config;
use ruleflow::orchestration::TurnEngine;
use ruleflow::selector::ParsePayload;
use ruleflow::shared::logging::dialogue_log_path;
use ruleflow::tracker::TrackerStore;
use serde_json::json;
use std::fs;
use tempfile::tempdir;

const RULES_YAML: &str = r#"
rules:
  - id: welcome
    conversation_start: true
    steps:
      - intent: greet
      - action: utter_welcome
  - id: chitchat
    steps:
      - intent: chitchat
      - action: respond_chitchat
  - id: activate-form
    steps:
      - intent: request_form
      - action: loop_q_form
      - active_loop: loop_q_form
  - id: inside-form
    condition:
      - active_loop: loop_q_form
    steps:
      - intent: inform
        entities:
          - some_slot: bla
      - action: loop_q_form
"#;

const TEMPLATES_YAML: &str = r#"
templates:
  utter_welcome:
    - text: "welcome, {name}!"
    - text: "hi from slack"
      channel: slack
  utter_chitchat/ask_weather:
    - text: "It is sunny."
"#;

fn parse_message(value: serde_json::Value) -> ParsePayload {
    serde_json::from_value(value).expect("parse payload")
}

#[test]
fn full_conversation_flow_across_components() {
    let dir = tempdir().expect("tempdir");
    let rules_path = dir.path().join("rules.yaml");
    let templates_path = dir.path().join("templates.yaml");
    fs::write(&rules_path, RULES_YAML).expect("write rules");
    fs::write(&templates_path, TEMPLATES_YAML).expect("write templates");

    let config = load_dialogue_config(&rules_path, &templates_path).expect("valid config");
    let engine = TurnEngine::new(config).with_log_root(dir.path());
    let mut store = TrackerStore::new();

    // Turn 1: conversation-start greeting with slot substitution pending.
    let greet = parse_message(json!({
        "text": "hello there",
        "intent": {"name": "greet", "confidence": 0.99},
        "entities": [{"name": "name", "value": "Ada"}],
        "response_selector": {}
    }));
    let outputs = engine
        .handle_message(store.tracker_for("ada"), &greet, "shell")
        .expect("turn 1");
    assert_eq!(outputs[0].action_name, "utter_welcome");
    assert_eq!(
        outputs[0].payload.as_ref().and_then(|p| p.text.as_deref()),
        Some("welcome, Ada!")
    );

    // Turn 2: retrieval intent resolved through the chitchat selector.
    let weather = parse_message(json!({
        "text": "what's the weather like?",
        "intent": {"name": "chitchat/ask_weather", "confidence": 0.93},
        "entities": [],
        "response_selector": {
            "faq": {
                "response": {
                    "confidence": 0.99,
                    "intent_response_key": "faq/ask_hours",
                    "response_templates": ["We open at nine."]
                },
                "ranking": []
            },
            "chitchat": {
                "response": {
                    "confidence": 0.87,
                    "intent_response_key": "chitchat/ask_weather",
                    "response_templates": ["It is sunny."]
                },
                "ranking": [
                    {"confidence": 0.87, "intent_response_key": "chitchat/ask_weather"},
                    {"confidence": 0.11, "intent_response_key": "chitchat/ask_name"}
                ]
            }
        }
    }));
    let outputs = engine
        .handle_message(store.tracker_for("ada"), &weather, "shell")
        .expect("turn 2");
    assert_eq!(outputs[0].action_name, "respond_chitchat");
    let payload = outputs[0].payload.as_ref().expect("utterance payload");
    assert_eq!(payload.template, "utter_chitchat/ask_weather");
    assert_eq!(payload.text.as_deref(), Some("It is sunny."));

    // Turn 3: form activation appends the loop marker.
    let request_form = parse_message(json!({
        "text": "start the questionnaire",
        "intent": {"name": "request_form", "confidence": 0.95},
        "entities": [],
        "response_selector": {}
    }));
    let outputs = engine
        .handle_message(store.tracker_for("ada"), &request_form, "shell")
        .expect("turn 3");
    assert_eq!(outputs[0].action_name, "loop_q_form");
    assert_eq!(store.get("ada").unwrap().active_loop(), Some("loop_q_form"));

    // Turn 4: the in-form rule continues the loop.
    let inform = parse_message(json!({
        "text": "bla",
        "intent": {"name": "inform", "confidence": 0.97},
        "entities": [{"name": "some_slot", "value": "bla"}],
        "response_selector": {}
    }));
    let outputs = engine
        .handle_message(store.tracker_for("ada"), &inform, "shell")
        .expect("turn 4");
    assert_eq!(outputs[0].action_name, "loop_q_form");

    // A second sender starts fresh and gets the conversation-start rule.
    let outputs = engine
        .handle_message(store.tracker_for("grace"), &greet, "slack")
        .expect("other sender");
    assert_eq!(
        outputs[0].payload.as_ref().and_then(|p| p.text.as_deref()),
        Some("hi from slack")
    );
    assert_eq!(store.len(), 2);

    // Every prediction left an audit line.
    let log = fs::read_to_string(dialogue_log_path(dir.path())).expect("audit log");
    assert!(log.lines().count() >= 5);
    assert!(log.contains("sender=ada"));
    assert!(log.contains("action=respond_chitchat"));
}
