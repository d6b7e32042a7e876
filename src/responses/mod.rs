pub mod error;
pub mod resolver;
pub mod substitute;

pub use error::ResponseError;
pub use resolver::{
    is_utterance_action, resolve, resolve_with_picker, template_name_for_action, OutputPayload,
    RESPOND_PREFIX, UTTER_PREFIX,
};
pub use substitute::{substitute_slots, Substituted};
