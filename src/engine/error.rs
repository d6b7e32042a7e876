#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(
        "rules `{first}` and `{second}` tie at specificity {specificity} with different next actions"
    )]
    AmbiguousRuleMatch {
        first: String,
        second: String,
        specificity: u64,
    },
}
