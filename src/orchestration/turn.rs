use super::error::TurnError;
use crate::config::{DialogueConfig, LoopMarker};
use crate::engine::{predict_next_action, ChainBoundary};
use crate::responses::{is_utterance_action, resolve, OutputPayload};
use crate::selector::{select, ParsePayload};
use crate::shared::logging::append_dialogue_log_line;
use crate::tracker::{Event, Tracker};
use chrono::Utc;
use std::path::PathBuf;

pub const DEFAULT_MAX_CHAIN_LENGTH: u32 = 10;

/// Built-in actions mapped directly from reserved intents. They overrule
/// rules whenever the tracker is awaiting user input.
pub const ACTION_RESTART: &str = "action_restart";
pub const ACTION_SESSION_START: &str = "action_session_start";

fn default_action_for(intent: &str) -> Option<&'static str> {
    match intent {
        "restart" => Some(ACTION_RESTART),
        "session_start" => Some(ACTION_SESSION_START),
        _ => None,
    }
}

/// One predicted action within a turn; `payload` is present only for
/// utterance-class actions.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutput {
    pub action_name: String,
    pub payload: Option<OutputPayload>,
}

/// Per-turn driver over the immutable dialogue configuration. Stateless
/// across senders; all conversation state lives in the caller's trackers.
#[derive(Debug, Clone)]
pub struct TurnEngine {
    config: DialogueConfig,
    max_chain_length: u32,
    log_root: Option<PathBuf>,
}

impl TurnEngine {
    pub fn new(config: DialogueConfig) -> Self {
        Self {
            config,
            max_chain_length: DEFAULT_MAX_CHAIN_LENGTH,
            log_root: None,
        }
    }

    pub fn with_max_chain_length(mut self, max_chain_length: u32) -> Self {
        self.max_chain_length = max_chain_length;
        self
    }

    pub fn with_log_root(mut self, log_root: impl Into<PathBuf>) -> Self {
        self.log_root = Some(log_root.into());
        self
    }

    pub fn config(&self) -> &DialogueConfig {
        &self.config
    }

    fn log(&self, sender_id: &str, line: &str) {
        if let Some(root) = &self.log_root {
            let stamped = format!("{} sender={sender_id} {line}", Utc::now().to_rfc3339());
            // Audit logging never fails the turn.
            let _ = append_dialogue_log_line(root, &stamped);
        }
    }

    /// Records the inbound user event and runs the bounded chain loop,
    /// resolving utterance actions to output payloads along the way.
    pub fn handle_message(
        &self,
        tracker: &mut Tracker,
        parse: &ParsePayload,
        active_channel: &str,
    ) -> Result<Vec<TurnOutput>, TurnError> {
        // Slots filled from the message's entities must be visible to
        // rule-entry conditions, which are evaluated as of the state
        // before the utterance step itself.
        for entity in &parse.entities {
            tracker.update(Event::SlotSet {
                key: entity.name.clone(),
                value: entity.value.clone(),
            });
        }
        tracker.update(Event::UserUttered {
            intent: parse.intent.name.clone(),
            entities: parse.entities.clone(),
            text: parse.text.clone(),
            input_channel: active_channel.to_string(),
        });

        if let Some(builtin) = default_action_for(&parse.intent.name) {
            tracker.update(Event::ActionExecuted {
                name: builtin.to_string(),
            });
            tracker.update(Event::Restarted);
            self.log(tracker.sender_id(), &format!("builtin action={builtin}"));
            return Ok(vec![TurnOutput {
                action_name: builtin.to_string(),
                payload: None,
            }]);
        }

        self.run_chained_actions(tracker, parse, active_channel)
    }

    fn run_chained_actions(
        &self,
        tracker: &mut Tracker,
        parse: &ParsePayload,
        active_channel: &str,
    ) -> Result<Vec<TurnOutput>, TurnError> {
        let mut outputs = Vec::new();
        let mut iterations = 0u32;
        loop {
            if iterations >= self.max_chain_length {
                self.log(
                    tracker.sender_id(),
                    &format!("chain guard tripped after {iterations} actions"),
                );
                return Err(TurnError::ChainLengthExceeded {
                    max_chain_length: self.max_chain_length,
                });
            }
            iterations += 1;

            let Some(prediction) = predict_next_action(tracker, &self.config.rules)? else {
                self.log(tracker.sender_id(), "no applicable rule");
                break;
            };

            let payload = if is_utterance_action(&prediction.action_name) {
                let retrieval = select(parse, &parse.intent.name)?;
                Some(resolve(
                    &prediction.action_name,
                    tracker,
                    active_channel,
                    &self.config.templates,
                    retrieval.as_ref(),
                )?)
            } else {
                None
            };

            tracker.update(Event::ActionExecuted {
                name: prediction.action_name.clone(),
            });
            for marker in &prediction.followup_loop_markers {
                tracker.update(match marker {
                    LoopMarker::Start(name) => Event::ActiveLoopStarted { name: name.clone() },
                    LoopMarker::End => Event::ActiveLoopEnded,
                });
            }
            self.log(
                tracker.sender_id(),
                &format!(
                    "rule={} action={} specificity={}",
                    prediction.rule_id, prediction.action_name, prediction.specificity
                ),
            );

            let boundary = prediction.boundary;
            outputs.push(TurnOutput {
                action_name: prediction.action_name,
                payload,
            });
            if boundary == ChainBoundary::AwaitUserInput {
                break;
            }
        }
        Ok(outputs)
    }
}
