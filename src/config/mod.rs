pub mod error;
pub mod load;
pub mod rules_file;
pub mod templates_file;
pub mod validate;

pub use error::ConfigError;
pub use load::{load_dialogue_config, DialogueConfig};
pub use rules_file::{LoopMarker, Predicate, Rule, RuleStep, RulesFile, SlotCondition};
pub use templates_file::{Button, TemplatesFile, Variation};
pub use validate::{validate_rules, validate_templates};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_defaults_wait_for_user_input() {
        let file: RulesFile = serde_yaml::from_str(
            r#"
rules:
  - id: greet
    steps:
      - intent: greet
      - action: utter_greet
"#,
        )
        .expect("rules yaml");
        assert!(file.rules[0].wait_for_user_input);
        assert!(!file.rules[0].conversation_start);
        assert!(file.rules[0].condition.is_empty());
    }

    #[test]
    fn loop_marker_distinguishes_null_from_name() {
        let file: RulesFile = serde_yaml::from_str(
            r#"
rules:
  - id: form-lifecycle
    steps:
      - action: loop_q_form
      - active_loop: loop_q_form
      - active_loop: null
"#,
        )
        .expect("rules yaml");
        let steps = &file.rules[0].steps;
        assert_eq!(
            steps[1].active_loop,
            Some(LoopMarker::Start("loop_q_form".to_string()))
        );
        assert_eq!(steps[2].active_loop, Some(LoopMarker::End));
        assert_eq!(steps[0].active_loop, None);
    }

    #[test]
    fn slot_condition_accepts_name_or_value_form() {
        let file: RulesFile = serde_yaml::from_str(
            r#"
rules:
  - id: slot-forms
    condition:
      - slot_was_set: mood
      - slot_was_set:
          mood: happy
    steps:
      - action: utter_cheer
"#,
        )
        .expect("rules yaml");
        let condition = &file.rules[0].condition;
        assert_eq!(
            condition[0].slot_was_set,
            Some(SlotCondition::Named("mood".to_string()))
        );
        assert!(matches!(
            condition[1].slot_was_set,
            Some(SlotCondition::Valued(_))
        ));
    }

    #[test]
    fn templates_parse_variation_fields() {
        let file: TemplatesFile = serde_yaml::from_str(
            r#"
templates:
  utter_greet:
    - text: "hello {name}"
    - text: "hey there"
      channel: slack
      buttons:
        - title: Wave
          payload: /wave
"#,
        )
        .expect("templates yaml");
        let variations = &file.templates["utter_greet"];
        assert_eq!(variations.len(), 2);
        assert_eq!(variations[1].channel.as_deref(), Some("slack"));
        assert_eq!(
            variations[1].buttons.as_ref().map(|b| b.len()),
            Some(1)
        );
    }
}
