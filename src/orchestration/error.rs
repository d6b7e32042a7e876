use crate::engine::EngineError;
use crate::responses::ResponseError;
use crate::selector::SelectorError;

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("turn chaining exceeded {max_chain_length} actions; possible rule cycle")]
    ChainLengthExceeded { max_chain_length: u32 },
    #[error("rule matching failed: {0}")]
    Engine(#[from] EngineError),
    #[error("response selection failed: {0}")]
    Selector(#[from] SelectorError),
    #[error("response resolution failed: {0}")]
    Response(#[from] ResponseError),
}
