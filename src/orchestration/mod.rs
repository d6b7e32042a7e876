pub mod error;
pub mod turn;

pub use error::TurnError;
pub use turn::{
    TurnEngine, TurnOutput, ACTION_RESTART, ACTION_SESSION_START, DEFAULT_MAX_CHAIN_LENGTH,
};
