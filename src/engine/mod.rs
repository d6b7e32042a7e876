pub mod error;
pub mod matching;

pub use error::EngineError;
pub use matching::{predict_next_action, ChainBoundary, Prediction, CONDITION_WEIGHT};
