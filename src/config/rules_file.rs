use super::ConfigError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One precondition on tracker state, checked once at rule entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Predicate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_loop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_was_set: Option<SlotCondition>,
}

/// `slot_was_set: name` checks presence; `slot_was_set: {name: value}`
/// checks the stored value too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotCondition {
    Named(String),
    Valued(BTreeMap<String, Value>),
}

/// Expected active-loop state after the preceding action step ran.
/// `active_loop: <name>` starts a loop, `active_loop: null` ends one.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopMarker {
    Start(String),
    End,
}

fn deserialize_loop_marker<'de, D>(deserializer: D) -> Result<Option<LoopMarker>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(Some(match raw {
        Some(name) => LoopMarker::Start(name),
        None => LoopMarker::End,
    }))
}

fn serialize_loop_marker<S>(marker: &Option<LoopMarker>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match marker {
        Some(LoopMarker::Start(name)) => serializer.serialize_some(name),
        Some(LoopMarker::End) | None => serializer.serialize_none(),
    }
}

/// One expected event in a rule: a user intent (optionally with entity
/// constraints), a bot action, or an active-loop marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<BTreeMap<String, Value>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_loop_marker",
        serialize_with = "serialize_loop_marker",
        skip_serializing_if = "Option::is_none"
    )]
    pub active_loop: Option<LoopMarker>,
}

impl RuleStep {
    pub fn is_action_step(&self) -> bool {
        self.action.is_some()
    }

    pub fn is_intent_step(&self) -> bool {
        self.intent.is_some()
    }

    pub fn is_loop_marker_step(&self) -> bool {
        self.active_loop.is_some()
    }
}

fn default_wait_for_user_input() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    pub id: String,
    #[serde(default)]
    pub condition: Vec<Predicate>,
    pub steps: Vec<RuleStep>,
    #[serde(default = "default_wait_for_user_input")]
    pub wait_for_user_input: bool,
    #[serde(default)]
    pub conversation_start: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesFile {
    pub rules: Vec<Rule>,
}

impl RulesFile {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}
