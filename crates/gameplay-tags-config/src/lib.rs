//! Configuration loading for gameplay-tags.
//!
//! A `tags.toml` file declares the tag tree and, optionally, named requirement
//! presets that gameplay code looks up by name:
//!
//! ```toml
//! [tags]
//! paths = ["State.Combat.Attacking", "State.Dead", "Status.Stunned"]
//!
//! [requirements.can_attack]
//! mode = "require_all"          # require_all | require_any | require_none
//! required = ["State.Combat"]
//! blocked = ["State.Dead"]
//!
//! [[requirements.can_attack.conditions]]
//! tag = "Status.Stunned"
//! exact = true
//! inverted = true
//! ```
//!
//! Every path is validated as dotted identifiers and expanded to include its
//! ancestors. Tags named by requirements join the tree automatically.
//!
//! ```ignore
//! let config = gameplay_tags_config::TagsConfig::from_file("assets/tags.toml")?;
//! for entry in config.entries() {
//!     println!("{} (depth {})", entry.path, entry.depth);
//! }
//! ```

mod toml_parser;

pub use toml_parser::{ConditionDef, ModeDef, RequirementDef, TagEntry, TagsConfig};

use std::path::PathBuf;

use thiserror::Error;

/// Errors during config loading.
#[derive(Debug, Error)]
pub enum TagsConfigError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid TOML or does not fit the schema.
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value parsed but is not acceptable.
    #[error("validation error: {0}")]
    Validation(String),
}
