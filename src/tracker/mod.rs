use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One extracted entity from a user utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub value: Value,
}

/// Conversation events. Appended in order; never mutated or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    UserUttered {
        intent: String,
        #[serde(default)]
        entities: Vec<Entity>,
        #[serde(default)]
        text: String,
        #[serde(default)]
        input_channel: String,
    },
    ActionExecuted {
        name: String,
    },
    SlotSet {
        key: String,
        value: Value,
    },
    ActiveLoopStarted {
        name: String,
    },
    ActiveLoopEnded,
    ConversationPaused,
    ConversationResumed,
    Restarted,
}

impl Event {
    /// Step events are the ones rule steps align against. Slot and pause
    /// events fold into derived state without consuming a rule step.
    pub fn is_step_event(&self) -> bool {
        matches!(
            self,
            Event::UserUttered { .. }
                | Event::ActionExecuted { .. }
                | Event::ActiveLoopStarted { .. }
                | Event::ActiveLoopEnded
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestMessage {
    pub intent: String,
    pub entities: Vec<Entity>,
    pub text: String,
}

/// Snapshot derived from the event log. Always recomputable by replay;
/// never authoritative on its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedState {
    pub slots: BTreeMap<String, Value>,
    pub active_loop: Option<String>,
    pub latest_message: Option<LatestMessage>,
    pub latest_action_name: Option<String>,
    pub paused: bool,
}

impl DerivedState {
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::UserUttered {
                intent,
                entities,
                text,
                ..
            } => {
                self.latest_message = Some(LatestMessage {
                    intent: intent.clone(),
                    entities: entities.clone(),
                    text: text.clone(),
                });
            }
            Event::ActionExecuted { name } => {
                self.latest_action_name = Some(name.clone());
            }
            Event::SlotSet { key, value } => {
                self.slots.insert(key.clone(), value.clone());
            }
            Event::ActiveLoopStarted { name } => {
                self.active_loop = Some(name.clone());
            }
            Event::ActiveLoopEnded => {
                self.active_loop = None;
            }
            Event::ConversationPaused => {
                self.paused = true;
            }
            Event::ConversationResumed => {
                self.paused = false;
            }
            Event::Restarted => {
                *self = DerivedState::default();
            }
        }
    }
}

/// Append-only event log for one conversation plus its cached fold.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracker {
    sender_id: String,
    events: Vec<Event>,
    state: DerivedState,
}

impl Tracker {
    pub fn new(sender_id: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            events: Vec::new(),
            state: DerivedState::default(),
        }
    }

    pub fn sender_id(&self) -> &str {
        &self.sender_id
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn update(&mut self, event: Event) {
        self.state.apply(&event);
        self.events.push(event);
    }

    pub fn state(&self) -> &DerivedState {
        &self.state
    }

    pub fn slots(&self) -> &BTreeMap<String, Value> {
        &self.state.slots
    }

    pub fn active_loop(&self) -> Option<&str> {
        self.state.active_loop.as_deref()
    }

    pub fn latest_message(&self) -> Option<&LatestMessage> {
        self.state.latest_message.as_ref()
    }

    pub fn latest_action_name(&self) -> Option<&str> {
        self.state.latest_action_name.as_deref()
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    /// Recompute the derived snapshot from scratch. Must always equal the
    /// incrementally maintained cache.
    pub fn replay(&self) -> DerivedState {
        self.state_at(self.events.len())
    }

    /// Fold of the first `upto` events.
    pub fn state_at(&self, upto: usize) -> DerivedState {
        let mut state = DerivedState::default();
        for event in &self.events[..upto.min(self.events.len())] {
            state.apply(event);
        }
        state
    }

    /// Effective history for rule matching. A `Restarted` event truncates
    /// the matching context; the full log stays queryable via `events()`.
    pub fn events_after_latest_restart(&self) -> &[Event] {
        let start = self
            .events
            .iter()
            .rposition(|event| matches!(event, Event::Restarted))
            .map(|pos| pos + 1)
            .unwrap_or(0);
        &self.events[start..]
    }
}

/// Caller-owned mapping of `sender_id` to its tracker. Trackers for
/// distinct senders are fully independent.
#[derive(Debug, Default)]
pub struct TrackerStore {
    trackers: BTreeMap<String, Tracker>,
}

impl TrackerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tracker for `sender_id`, creating it on first contact.
    pub fn tracker_for(&mut self, sender_id: &str) -> &mut Tracker {
        self.trackers
            .entry(sender_id.to_string())
            .or_insert_with(|| Tracker::new(sender_id))
    }

    pub fn get(&self, sender_id: &str) -> Option<&Tracker> {
        self.trackers.get(sender_id)
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }
}
