use super::error::ResponseError;
use super::substitute::substitute_slots;
use crate::config::{Button, Variation};
use crate::selector::RetrievalResult;
use crate::tracker::Tracker;
use serde_json::Value;
use std::collections::BTreeMap;

pub const UTTER_PREFIX: &str = "utter_";
pub const RESPOND_PREFIX: &str = "respond_";

/// Utterance-class actions are the ones the resolver produces output for.
pub fn is_utterance_action(action_name: &str) -> bool {
    action_name.starts_with(UTTER_PREFIX) || action_name.starts_with(RESPOND_PREFIX)
}

/// Concrete output for one bot utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPayload {
    pub template: String,
    pub text: Option<String>,
    pub image: Option<String>,
    pub buttons: Vec<Button>,
    pub custom: Option<Value>,
    pub unresolved_variables: Vec<String>,
}

/// `utter_X` maps to the template of the same name; `respond_<ri>` maps
/// through the selector's `intent_response_key` to `utter_<ri>/<key>`.
/// A retrieval action without selector output falls back to a plain
/// lookup under its own name; a missing template surfaces from there.
pub fn template_name_for_action(action_name: &str, retrieval: Option<&RetrievalResult>) -> String {
    if action_name.starts_with(RESPOND_PREFIX) {
        if let Some(retrieval) = retrieval {
            return format!("{UTTER_PREFIX}{}", retrieval.response.intent_response_key);
        }
    }
    action_name.to_string()
}

/// Channel-specific variations take total precedence: when any variation
/// names the active channel, only those are candidates. Otherwise only
/// channel-free variations are.
fn filter_variations<'a>(variations: &'a [Variation], active_channel: &str) -> Vec<&'a Variation> {
    let channel_specific: Vec<&Variation> = variations
        .iter()
        .filter(|variation| variation.channel.as_deref() == Some(active_channel))
        .collect();
    if !channel_specific.is_empty() {
        return channel_specific;
    }
    variations
        .iter()
        .filter(|variation| variation.channel.is_none())
        .collect()
}

fn random_index(len: usize) -> usize {
    let mut bytes = [0u8; 4];
    if getrandom::getrandom(&mut bytes).is_err() {
        return 0;
    }
    u32::from_le_bytes(bytes) as usize % len
}

/// Resolves an utterance action to concrete output content. The tracker
/// is read for slot substitution only; recording the resulting events is
/// the caller's job.
pub fn resolve(
    action_name: &str,
    tracker: &Tracker,
    active_channel: &str,
    templates: &BTreeMap<String, Vec<Variation>>,
    retrieval: Option<&RetrievalResult>,
) -> Result<OutputPayload, ResponseError> {
    resolve_with_picker(
        action_name,
        tracker,
        active_channel,
        templates,
        retrieval,
        random_index,
    )
}

/// Same as [`resolve`] with the variation pick injected, so callers that
/// need reproducibility can seed their own source of randomness.
pub fn resolve_with_picker<F>(
    action_name: &str,
    tracker: &Tracker,
    active_channel: &str,
    templates: &BTreeMap<String, Vec<Variation>>,
    retrieval: Option<&RetrievalResult>,
    mut pick: F,
) -> Result<OutputPayload, ResponseError>
where
    F: FnMut(usize) -> usize,
{
    let template = template_name_for_action(action_name, retrieval);
    let variations = templates
        .get(&template)
        .ok_or_else(|| ResponseError::MissingTemplate {
            action_name: action_name.to_string(),
            template: template.clone(),
        })?;

    let candidates = filter_variations(variations, active_channel);
    if candidates.is_empty() {
        return Err(ResponseError::EmptyVariationSet {
            template,
            channel: active_channel.to_string(),
        });
    }

    let variation = candidates[pick(candidates.len()) % candidates.len()];
    let mut text = None;
    let mut unresolved_variables = Vec::new();
    if let Some(raw) = &variation.text {
        let substituted = substitute_slots(raw, tracker.slots());
        text = Some(substituted.text);
        unresolved_variables = substituted.unresolved;
    }

    Ok(OutputPayload {
        template,
        text,
        image: variation.image.clone(),
        buttons: variation.buttons.clone().unwrap_or_default(),
        custom: variation.custom.clone(),
        unresolved_variables,
    })
}
