use crate::tracker::Entity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Selector output keyed under this name is the fallback when no selector
/// was declared for the current retrieval intent.
pub const DEFAULT_SELECTOR_KEY: &str = "default";

/// Reserved namespace delimiter inside retrieval intent names. Ordinary
/// intent names must not contain it.
pub const RETRIEVAL_INTENT_DELIMITER: char = '/';

/// Upstream rankings longer than this are truncated, order preserved.
pub const MAX_RANKING_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentPrediction {
    pub name: String,
    #[serde(default)]
    pub confidence: f64,
}

/// Inbound parse payload from the NLU collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsePayload {
    #[serde(default)]
    pub text: String,
    pub intent: IntentPrediction,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub response_selector: BTreeMap<String, RetrievalResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub confidence: f64,
    pub intent_response_key: String,
    #[serde(default)]
    pub response_templates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub confidence: f64,
    pub intent_response_key: String,
}

/// Per-selector classifier output for one user turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub response: SelectedResponse,
    #[serde(default)]
    pub ranking: Vec<RankedResponse>,
}

#[derive(Debug, thiserror::Error)]
pub enum SelectorError {
    #[error(
        "response selector `{selector}` ranking is not confidence-descending at position {position}"
    )]
    RankingNotSorted { selector: String, position: usize },
}

/// Splits `chitchat/ask_weather` into `("chitchat", "ask_weather")`.
/// Returns `None` for plain intents, which are not retrieval actions.
pub fn split_retrieval_intent(predicted_intent: &str) -> Option<(&str, &str)> {
    predicted_intent.split_once(RETRIEVAL_INTENT_DELIMITER)
}

/// Looks up the selector output for the predicted intent's retrieval
/// namespace. Only the matching selector is consulted; output from
/// selectors for other retrieval intents is ignored for this turn. The
/// ranking is validated non-increasing and truncated; upstream order is
/// otherwise preserved, this never re-sorts.
pub fn select(
    parse: &ParsePayload,
    predicted_intent: &str,
) -> Result<Option<RetrievalResult>, SelectorError> {
    let Some((retrieval_intent, _response_key)) = split_retrieval_intent(predicted_intent) else {
        return Ok(None);
    };
    let (selector_key, result) = match parse.response_selector.get(retrieval_intent) {
        Some(result) => (retrieval_intent, result),
        None => match parse.response_selector.get(DEFAULT_SELECTOR_KEY) {
            Some(result) => (DEFAULT_SELECTOR_KEY, result),
            None => return Ok(None),
        },
    };

    for (position, pair) in result.ranking.windows(2).enumerate() {
        if pair[1].confidence > pair[0].confidence {
            return Err(SelectorError::RankingNotSorted {
                selector: selector_key.to_string(),
                position: position + 1,
            });
        }
    }

    let mut selected = result.clone();
    selected.ranking.truncate(MAX_RANKING_LEN);
    Ok(Some(selected))
}
