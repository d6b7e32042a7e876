use super::error::EngineError;
use crate::config::{LoopMarker, Predicate, Rule, RuleStep, SlotCondition};
use crate::selector::RETRIEVAL_INTENT_DELIMITER;
use crate::tracker::{DerivedState, Event, Tracker};

/// Condition count dominates matched prefix length in the specificity
/// score: explicit preconditions outrank longer coincidental matches.
pub const CONDITION_WEIGHT: u64 = 1_000;

/// Whether the chaining loop should keep predicting after executing the
/// predicted action, or stop and await the next inbound user event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainBoundary {
    AwaitUserInput,
    Continue,
}

/// The engine's answer for one prediction request.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub action_name: String,
    pub rule_id: String,
    pub specificity: u64,
    /// Active-loop markers declared directly after the predicted action
    /// step. The caller appends these as tracker events right after the
    /// `ActionExecuted`, so re-evaluation sees the loop state.
    pub followup_loop_markers: Vec<LoopMarker>,
    pub boundary: ChainBoundary,
}

fn step_matches_event(step: &RuleStep, event: &Event) -> bool {
    if let Some(expected_intent) = &step.intent {
        let Event::UserUttered {
            intent, entities, ..
        } = event
        else {
            return false;
        };
        // Retrieval intents carry a `/`-separated response key; rule
        // steps name only the retrieval intent itself.
        let base_intent = intent
            .split_once(RETRIEVAL_INTENT_DELIMITER)
            .map(|(base, _)| base)
            .unwrap_or(intent.as_str());
        if base_intent != expected_intent {
            return false;
        }
        // Declared entity constraints must all be present; extra
        // utterance entities are ignored (unspecified fields wildcard).
        if let Some(expected_entities) = &step.entities {
            for constraint in expected_entities {
                for (name, value) in constraint {
                    let present = entities
                        .iter()
                        .any(|entity| &entity.name == name && &entity.value == value);
                    if !present {
                        return false;
                    }
                }
            }
        }
        return true;
    }
    if let Some(expected_action) = &step.action {
        return matches!(event, Event::ActionExecuted { name } if name == expected_action);
    }
    match &step.active_loop {
        Some(LoopMarker::Start(expected)) => {
            matches!(event, Event::ActiveLoopStarted { name } if name == expected)
        }
        Some(LoopMarker::End) => matches!(event, Event::ActiveLoopEnded),
        None => false,
    }
}

fn conditions_hold(condition: &[Predicate], state: &DerivedState) -> bool {
    condition.iter().all(|predicate| {
        if let Some(expected_loop) = &predicate.active_loop {
            return state.active_loop.as_deref() == Some(expected_loop.as_str());
        }
        match &predicate.slot_was_set {
            Some(SlotCondition::Named(name)) => state.slots.contains_key(name),
            Some(SlotCondition::Valued(expected)) => expected
                .iter()
                .all(|(name, value)| state.slots.get(name) == Some(value)),
            None => false,
        }
    })
}

#[derive(Debug)]
struct Candidate<'a> {
    rule: &'a Rule,
    matched_len: usize,
    specificity: u64,
}

/// Aligns the rule's leading steps with the trailing step events of the
/// tracker's post-restart history. Conditions are evaluated once, against
/// the state as of the point the alignment begins. Returns `None` when
/// the rule is not applicable.
fn rule_candidate<'a>(tracker: &Tracker, rule: &'a Rule) -> Option<Candidate<'a>> {
    let window = tracker.events_after_latest_restart();
    let window_offset = tracker.events().len() - window.len();
    let step_events: Vec<usize> = window
        .iter()
        .enumerate()
        .filter(|(_, event)| event.is_step_event())
        .map(|(index, _)| window_offset + index)
        .collect();

    let max_len = rule.steps.len().min(step_events.len());
    let matched_len = (0..=max_len)
        .rev()
        .find(|len| {
            let tail = &step_events[step_events.len() - len..];
            rule.steps[..*len]
                .iter()
                .zip(tail)
                .all(|(step, index)| step_matches_event(step, &tracker.events()[*index]))
        })
        .unwrap_or(0);

    // No prior completed turns allowed for conversation-start rules: the
    // matched alignment must cover the whole post-restart step history.
    if rule.conversation_start && step_events.len() > matched_len {
        return None;
    }

    let entry_index = if matched_len > 0 {
        step_events[step_events.len() - matched_len]
    } else {
        tracker.events().len()
    };
    if !conditions_hold(&rule.condition, &tracker.state_at(entry_index)) {
        return None;
    }

    Some(Candidate {
        rule,
        matched_len,
        specificity: rule.condition.len() as u64 * CONDITION_WEIGHT + matched_len as u64,
    })
}

fn prediction_from(candidate: &Candidate<'_>) -> Option<Prediction> {
    let rule = candidate.rule;
    // Exhausted rules propose nothing further; a fully matched rule with
    // `wait_for_user_input: false` terminates the chain by not
    // re-triggering its last action.
    let next_step = rule.steps.get(candidate.matched_len)?;
    // Intent and loop-marker steps describe expected user input or the
    // consequence of an already-executed action; neither is predictable.
    let action_name = next_step.action.as_ref()?;

    let mut followup_loop_markers = Vec::new();
    let mut cursor = candidate.matched_len + 1;
    while let Some(step) = rule.steps.get(cursor) {
        match &step.active_loop {
            Some(marker) => followup_loop_markers.push(marker.clone()),
            None => break,
        }
        cursor += 1;
    }

    let boundary = match rule.steps.get(cursor) {
        Some(step) if step.is_action_step() => ChainBoundary::Continue,
        Some(_) => ChainBoundary::AwaitUserInput,
        None if rule.wait_for_user_input => ChainBoundary::AwaitUserInput,
        None => ChainBoundary::Continue,
    };

    Some(Prediction {
        action_name: action_name.clone(),
        rule_id: rule.id.clone(),
        specificity: candidate.specificity,
        followup_loop_markers,
        boundary,
    })
}

/// Picks the next action for the tracker, or `None` when no rule applies
/// (the caller falls back to another policy). A specificity tie between
/// rules proposing different actions is an explicit ambiguity error,
/// never a silent configuration-order-dependent pick.
pub fn predict_next_action(
    tracker: &Tracker,
    rules: &[Rule],
) -> Result<Option<Prediction>, EngineError> {
    if tracker.is_paused() {
        return Ok(None);
    }

    let predictions: Vec<Prediction> = rules
        .iter()
        .filter_map(|rule| rule_candidate(tracker, rule))
        .filter_map(|candidate| prediction_from(&candidate))
        .collect();
    let Some(top) = predictions.iter().map(|p| p.specificity).max() else {
        return Ok(None);
    };

    // Only ties at the winning specificity matter. Same action at the
    // same specificity is order-independent; the earliest declaration
    // stays the reported winner.
    let mut winner: Option<Prediction> = None;
    for prediction in predictions {
        if prediction.specificity != top {
            continue;
        }
        match &winner {
            Some(current) if prediction.action_name != current.action_name => {
                return Err(EngineError::AmbiguousRuleMatch {
                    first: current.rule_id.clone(),
                    second: prediction.rule_id,
                    specificity: top,
                });
            }
            Some(_) => {}
            None => winner = Some(prediction),
        }
    }
    Ok(winner)
}
