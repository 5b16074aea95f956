#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("group union '{union}' references unknown group '{group}'")]
    UnknownUnionGroup { union: String, group: String },
    #[error("group union '{0}' has no member groups")]
    EmptyUnion(String),
    #[error("normalization factor must be a positive finite number, got {0}")]
    InvalidKnorm(f64),
    #[error("invalid thesaurus: {0}")]
    InvalidThesaurus(String),
}
