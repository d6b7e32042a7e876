#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("no response template `{template}` for action `{action_name}`")]
    MissingTemplate {
        action_name: String,
        template: String,
    },
    #[error("no variation of template `{template}` is usable on channel `{channel}`")]
    EmptyVariationSet { template: String, channel: String },
}
