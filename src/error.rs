//! Errors raised while parsing or registering tags.

use thiserror::Error;

/// Why a tag string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    /// The input was empty or only whitespace.
    #[error("tag name is empty")]
    Empty,

    /// A segment was empty after trimming (leading, trailing or doubled dot).
    #[error("tag '{input}' has an empty segment")]
    EmptySegment { input: String },
}

/// Why a tags.toml file could not be turned into a registry.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] gameplay_tags_config::TagsConfigError),

    #[error("requirement '{name}': {source}")]
    Requirement {
        name: String,
        #[source]
        source: TagError,
    },

    #[error(transparent)]
    Tag(#[from] TagError),
}
