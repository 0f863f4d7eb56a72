//! # Hierarchical Gameplay Tags (gameplay-tags)
//!
//! Dot-separated tags (`State.Combat.Attacking`) for gating abilities and
//! state transitions, in the style of UE5 GameplayTags.
//!
//! - [`TagId`]: an immutable tag name with a precomputed hierarchical [`GID`]
//! - [`TagRegistry`]: interns names so equal tags share one allocation
//! - [`TagContainer`]: the tags an entity holds, with stack counts and change
//!   listeners
//! - [`Requirement`] / [`CompositeRequirement`]: rules evaluated against a
//!   container
//!
//! ## Design
//!
//! A `GID` is a `u128` with the tag's level and a fixed bit allocation across
//! 8 levels:
//!
//! ```text
//! ┌─────────┬──────────┬──────────┬──────────┬──────────┬──────────┬──────────┬──────────┬──────────┐
//! │ Level   │ Slot 0   │ Slot 1   │ Slot 2   │ Slot 3   │ Slot 4   │ Slot 5   │ Slot 6   │ Slot 7   │
//! │ 3 bits  │ 21 bits  │ 18 bits  │ 16 bits  │ 16 bits  │ 14 bits  │ 14 bits  │ 13 bits  │ 13 bits  │
//! └─────────┴──────────┴──────────┴──────────┴──────────┴──────────┴──────────┴──────────┴──────────┘
//! ```
//!
//! Each slot holds a case-insensitive hash of one segment, so an ancestor's
//! GID is a bit prefix of its descendants'. Hierarchy checks reject on the GID
//! in O(1) and confirm on the name, which keeps them exact even when two
//! segments hash alike.
//!
//! ```ignore
//! use gameplay_tags::{Requirement, TagContainer, TagRegistry};
//!
//! let registry = TagRegistry::new();
//! let combat = registry.register("State.Combat");
//! let dead = registry.register("State.Dead");
//!
//! let mut tags = TagContainer::new();
//! tags.add(&registry.register("State.Combat.Attacking"));
//!
//! let can_attack = Requirement::all([combat]).with_blocked(dead);
//! assert!(can_attack.is_satisfied_by(&tags));
//! ```

pub mod bevy;
pub mod composite;
pub mod config;
pub mod container;
pub mod error;
pub mod hash;
pub mod layout;
pub mod registry;
pub mod requirement;
pub mod tag;

pub use composite::{Combinator, CompositeRequirement};
pub use config::{LoadedTags, RequirementSet};
pub use container::{ListenerId, TagContainer, TagEvent};
pub use error::{ConfigError, TagError};
pub use hash::{path_gid, segment_hash};
pub use layout::{EMPTY_GID, MAX_DEPTH, gid_is_descendant_of, level_of, parent_of};
pub use registry::{TagEntry, TagRegistry};
pub use requirement::{Requirement, RequirementMode, TagCondition, TagPredicate, Unmet};
pub use tag::TagId;

/// Global Identifier: a hierarchical hash of a tag path packed into u128.
///
/// The top 3 bits encode the level (segment count minus one), the remaining
/// 125 bits are partitioned into one slot per level. `0` is reserved for the
/// empty tag.
pub type GID = u128;
