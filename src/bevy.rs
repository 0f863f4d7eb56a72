//! Bevy integration for gameplay tags.
//!
//! Provides:
//! - `TagPlugin`: builder-pattern plugin that inserts the [`TagRegistry`] and
//!   [`TagRequirements`] resources
//! - [`TagContainer`] is a `Component`, so entities carry their tags directly
//!
//! # Example
//!
//! ```ignore
//! use bevy::prelude::*;
//! use gameplay_tags::bevy::*;
//! use gameplay_tags::{TagContainer, TagRegistry};
//!
//! fn main() {
//!     let config = gameplay_tags_config::TagsConfig::from_file("assets/tags.toml").unwrap();
//!     App::new()
//!         .add_plugins(TagPlugin::from_config(config).unwrap())
//!         .add_systems(Update, gate_attacks)
//!         .run();
//! }
//!
//! fn gate_attacks(requirements: Res<TagRequirements>, query: Query<(Entity, &TagContainer)>) {
//!     let Some(can_attack) = requirements.get("can_attack") else { return };
//!     for (entity, tags) in &query {
//!         if can_attack.is_satisfied_by(tags) {
//!             // entity may attack
//!         }
//!     }
//! }
//! ```

use std::ops::{Deref, DerefMut};

use bevy::prelude::*;
use gameplay_tags_config::TagsConfig;

use crate::config::{self, LoadedTags, RequirementSet};
use crate::error::ConfigError;
use crate::registry::TagRegistry;

// =============================================================================
// Plugin
// =============================================================================

/// Bevy plugin for the tag system.
///
/// ```ignore
/// App::new()
///     .add_plugins(TagPlugin::new().with_paths(["State.Combat", "State.Dead"]))
/// ```
#[derive(Default)]
pub struct TagPlugin {
    config: Option<TagsConfig>,
    paths: Vec<String>,
}

impl TagPlugin {
    /// Create a plugin with an empty registry.
    ///
    /// Tags can still be registered at runtime through `ResMut<TagRegistry>`
    /// or a shared `Res<TagRegistry>`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a plugin from a parsed tags.toml.
    ///
    /// The config is built once here so bad requirement tags surface before
    /// the app starts.
    pub fn from_config(config: TagsConfig) -> Result<Self, ConfigError> {
        config::build(&config)?;
        Ok(Self {
            config: Some(config),
            paths: Vec::new(),
        })
    }

    /// Register extra paths on top of the config.
    pub fn with_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths.extend(paths.into_iter().map(Into::into));
        self
    }
}

impl Plugin for TagPlugin {
    fn build(&self, app: &mut App) {
        let loaded = match &self.config {
            Some(config) => config::build(config).unwrap_or_else(|err| {
                tracing::error!(%err, "tag config failed to build, starting with an empty registry");
                LoadedTags::default()
            }),
            None => LoadedTags::default(),
        };

        for path in &self.paths {
            loaded.registry.register(path);
        }

        app.insert_resource(loaded.registry);
        app.insert_resource(TagRequirements(loaded.requirements));
    }
}

// =============================================================================
// Resources
// =============================================================================

impl Resource for TagRegistry {}

/// Named requirements loaded from config.
#[derive(Resource, Debug, Default)]
pub struct TagRequirements(pub RequirementSet);

impl Deref for TagRequirements {
    type Target = RequirementSet;

    fn deref(&self) -> &RequirementSet {
        &self.0
    }
}

impl DerefMut for TagRequirements {
    fn deref_mut(&mut self) -> &mut RequirementSet {
        &mut self.0
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::TagContainer;
    use crate::requirement::Requirement;

    const CONFIG: &str = r#"
[tags]
paths = ["State.Combat", "State.Dead"]

[requirements.can_attack]
required = ["State.Combat"]
blocked = ["State.Dead"]
"#;

    #[test]
    fn plugin_inserts_resources() {
        let mut app = App::new();
        app.add_plugins(TagPlugin::new().with_paths(["Movement.Running"]));

        let registry = app.world().resource::<TagRegistry>();
        assert!(registry.contains("Movement"));
        assert!(registry.contains("Movement.Running"));
        assert!(app.world().resource::<TagRequirements>().is_empty());
    }

    #[test]
    fn plugin_from_config() {
        let config = TagsConfig::parse(CONFIG).unwrap();
        let mut app = App::new();
        app.add_plugins(TagPlugin::from_config(config).unwrap().with_paths(["Status.Stunned"]));

        let registry = app.world().resource::<TagRegistry>();
        assert_eq!(registry.len(), 5);
        assert!(app.world().resource::<TagRequirements>().contains("can_attack"));
    }

    #[test]
    fn containers_are_components() {
        let config = TagsConfig::parse(CONFIG).unwrap();
        let mut app = App::new();
        app.add_plugins(TagPlugin::from_config(config).unwrap());

        let (combat, dead) = {
            let registry = app.world().resource::<TagRegistry>();
            (registry.register("State.Combat"), registry.register("State.Dead"))
        };

        let world = app.world_mut();
        world.spawn(TagContainer::new().with(&combat));
        world.spawn(TagContainer::new().with(&combat).with(&dead));

        let can_attack: Requirement = world
            .resource::<TagRequirements>()
            .get("can_attack")
            .cloned()
            .unwrap();

        let mut query = world.query::<&TagContainer>();
        let allowed = query.iter(world).filter(|tags| can_attack.is_satisfied_by(tags)).count();
        assert_eq!(allowed, 1);
    }
}
