//! Builds a [`TagRegistry`] and named [`Requirement`]s from a tags.toml file.
//!
//! Parsing and path validation live in `gameplay-tags-config`; this module
//! interns every declared path and turns each requirement preset into a
//! [`Requirement`] whose tags point at the registry's shared instances.

use std::collections::BTreeMap;
use std::path::Path;

use gameplay_tags_config::{ModeDef, RequirementDef, TagsConfig};

use crate::error::{ConfigError, TagError};
use crate::registry::TagRegistry;
use crate::requirement::{Requirement, RequirementMode, TagCondition};
use crate::tag::TagId;

/// Requirements looked up by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequirementSet {
    by_name: BTreeMap<String, Requirement>,
}

impl RequirementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a named requirement, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, requirement: Requirement) -> Option<Requirement> {
        self.by_name.insert(name.into(), requirement)
    }

    pub fn get(&self, name: &str) -> Option<&Requirement> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Requirement)> {
        self.by_name.iter().map(|(name, req)| (name.as_str(), req))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Registry plus requirements built from one config.
#[derive(Debug, Default)]
pub struct LoadedTags {
    pub registry: TagRegistry,
    pub requirements: RequirementSet,
}

/// Read, validate and intern a tags.toml file.
pub fn load(path: impl AsRef<Path>) -> Result<LoadedTags, ConfigError> {
    let config = TagsConfig::from_file(path)?;
    build(&config)
}

/// Intern every path of `config` and build its requirement presets.
pub fn build(config: &TagsConfig) -> Result<LoadedTags, ConfigError> {
    let registry = TagRegistry::from_paths(config.paths())?;

    let mut requirements = RequirementSet::new();
    for (name, def) in config.requirements() {
        let requirement = requirement_from_def(def, &registry).map_err(|source| {
            ConfigError::Requirement {
                name: name.clone(),
                source,
            }
        })?;
        requirements.insert(name.clone(), requirement);
    }

    tracing::debug!(
        tags = registry.len(),
        requirements = requirements.len(),
        "built tag registry from config"
    );
    Ok(LoadedTags {
        registry,
        requirements,
    })
}

/// Convert one preset, registering any tag it names that the registry lacks.
pub fn requirement_from_def(def: &RequirementDef, registry: &TagRegistry) -> Result<Requirement, TagError> {
    let intern = |path: &String| -> Result<TagId, TagError> { registry.try_register(path) };

    let mode = match def.mode {
        ModeDef::RequireAll => RequirementMode::RequireAll,
        ModeDef::RequireAny => RequirementMode::RequireAny,
        ModeDef::RequireNone => RequirementMode::RequireNone,
    };

    let required = def.required.iter().map(intern).collect::<Result<Vec<_>, _>>()?;
    let blocked = def.blocked.iter().map(intern).collect::<Result<Vec<_>, _>>()?;

    let mut requirement = Requirement::new(mode)
        .with_required_tags(required)
        .with_blocked_tags(blocked)
        .exact_required(def.exact_required)
        .exact_blocked(def.exact_blocked)
        .ignore_if_empty(def.ignore_if_empty);

    for condition in &def.conditions {
        requirement = requirement.with_condition(TagCondition {
            tag: intern(&condition.tag)?,
            exact: condition.exact,
            inverted: condition.inverted,
        });
    }
    Ok(requirement)
}
