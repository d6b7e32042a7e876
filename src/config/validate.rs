use super::{ConfigError, RulesFile, TemplatesFile};
use crate::responses::UTTER_PREFIX;
use crate::selector::RETRIEVAL_INTENT_DELIMITER;
use std::collections::HashSet;

pub fn validate_rules(file: &RulesFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();
    for rule in &file.rules {
        if rule.id.trim().is_empty() {
            return Err(ConfigError::Rules("rule id must be non-empty".to_string()));
        }
        if !seen_ids.insert(rule.id.as_str()) {
            return Err(ConfigError::Rules(format!(
                "duplicate rule id `{}`",
                rule.id
            )));
        }
        if rule.steps.is_empty() {
            return Err(ConfigError::Rules(format!(
                "rule `{}` declares no steps",
                rule.id
            )));
        }
        for (index, step) in rule.steps.iter().enumerate() {
            let declared = [
                step.intent.is_some(),
                step.action.is_some(),
                step.active_loop.is_some(),
            ]
            .iter()
            .filter(|set| **set)
            .count();
            if declared != 1 {
                return Err(ConfigError::Rules(format!(
                    "rule `{}` step {index} must declare exactly one of `intent`, `action`, `active_loop`",
                    rule.id
                )));
            }
            if step.entities.is_some() && step.intent.is_none() {
                return Err(ConfigError::Rules(format!(
                    "rule `{}` step {index} declares `entities` without `intent`",
                    rule.id
                )));
            }
            if let Some(intent) = &step.intent {
                if intent.contains(RETRIEVAL_INTENT_DELIMITER) {
                    return Err(ConfigError::Rules(format!(
                        "rule `{}` step {index}: intent `{intent}` uses the reserved `{RETRIEVAL_INTENT_DELIMITER}` delimiter",
                        rule.id
                    )));
                }
            }
            if let Some(action) = &step.action {
                if action.trim().is_empty() {
                    return Err(ConfigError::Rules(format!(
                        "rule `{}` step {index} declares an empty action name",
                        rule.id
                    )));
                }
            }
        }
        for (index, predicate) in rule.condition.iter().enumerate() {
            let declared = predicate.active_loop.is_some() as usize
                + predicate.slot_was_set.is_some() as usize;
            if declared != 1 {
                return Err(ConfigError::Rules(format!(
                    "rule `{}` condition {index} must declare exactly one of `active_loop`, `slot_was_set`",
                    rule.id
                )));
            }
        }
    }
    Ok(())
}

pub fn validate_templates(file: &TemplatesFile) -> Result<(), ConfigError> {
    for (name, variations) in &file.templates {
        if !name.starts_with(UTTER_PREFIX) {
            return Err(ConfigError::Templates(format!(
                "template `{name}` must be named `{UTTER_PREFIX}...`"
            )));
        }
        if name.matches(RETRIEVAL_INTENT_DELIMITER).count() > 1 {
            return Err(ConfigError::Templates(format!(
                "template `{name}` uses the reserved `{RETRIEVAL_INTENT_DELIMITER}` delimiter more than once"
            )));
        }
        if variations.is_empty() {
            return Err(ConfigError::Templates(format!(
                "template `{name}` declares no variations"
            )));
        }
        for (index, variation) in variations.iter().enumerate() {
            if !variation.has_content() {
                return Err(ConfigError::Templates(format!(
                    "template `{name}` variation {index} has no content"
                )));
            }
        }
    }
    Ok(())
}
