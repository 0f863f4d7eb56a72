//! Requirement rules gating abilities and state transitions.
//!
//! A [`Requirement`] is evaluated against a [`TagContainer`] in a fixed order,
//! stopping at the first failure:
//!
//! 1. **Empty shortcut**: with no required, blocked or conditional tags, return
//!    the configured `ignore_if_empty` answer.
//! 2. **Blocked tags**: any blocked tag held fails, whatever the mode. An
//!    entity that is both eligible and blocked is blocked.
//! 3. **Conditions**: every [`TagCondition`] must hold.
//! 4. **Required tags**: checked according to [`RequirementMode`].
//!
//! Evaluation has no side effects; the same requirement can be checked against
//! any number of containers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::container::TagContainer;
use crate::tag::TagId;

/// Anything that can gate an action on a container's tags.
pub trait TagPredicate {
    fn is_satisfied_by(&self, container: &TagContainer) -> bool;
}

/// How the required tags are combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementMode {
    /// Every required tag must be held.
    #[default]
    RequireAll,
    /// At least one required tag must be held (vacuously true when none are listed).
    RequireAny,
    /// None of the listed tags may be held.
    RequireNone,
}

/// Per-tag presence test with its own exactness and polarity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagCondition {
    pub tag: TagId,
    /// Only the tag itself counts, not its descendants.
    pub exact: bool,
    /// Pass when the tag is absent instead of present.
    pub inverted: bool,
}

impl TagCondition {
    /// Passes while `tag` (or a descendant) is held.
    pub fn present(tag: TagId) -> Self {
        Self {
            tag,
            exact: false,
            inverted: false,
        }
    }

    /// Passes while `tag` (or a descendant) is not held.
    pub fn absent(tag: TagId) -> Self {
        Self {
            tag,
            exact: false,
            inverted: true,
        }
    }

    pub fn exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    pub fn is_met_by(&self, container: &TagContainer) -> bool {
        holds(container, &self.tag, self.exact) != self.inverted
    }
}

/// First reason a requirement rejected a container.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Unmet {
    /// The requirement is empty and configured to fail in that case.
    #[error("empty requirement is configured to fail")]
    EmptyRejected,
    #[error("blocked by tag '{0}'")]
    Blocked(TagId),
    #[error("condition on tag '{}' not met", .0.tag)]
    Condition(TagCondition),
    #[error("missing required tag '{0}'")]
    Missing(TagId),
    /// `RequireAny` with none of the listed tags held.
    #[error("none of the required tags are held")]
    NoneHeld,
    /// `RequireNone` with a listed tag held.
    #[error("forbidden tag '{0}' is held")]
    Forbidden(TagId),
    /// Every alternative of an OR composite failed.
    #[error("no alternative was satisfied")]
    NoAlternative,
    /// Child `index` of an AND composite failed.
    #[error("requirement #{index} failed: {reason}")]
    Child { index: usize, reason: Box<Unmet> },
}

/// Boolean gate over required and blocked tags.
///
/// Built once with the consuming `with_*` methods, then only read:
///
/// ```ignore
/// let can_attack = Requirement::all([combat.clone()])
///     .with_blocked(dead.clone())
///     .with_condition(TagCondition::absent(stunned.clone()).exact(true));
///
/// if can_attack.is_satisfied_by(&tags) { /* activate */ }
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Requirement {
    mode: RequirementMode,
    required: Vec<TagId>,
    blocked: Vec<TagId>,
    conditions: Vec<TagCondition>,
    exact_required: bool,
    exact_blocked: bool,
    ignore_if_empty: bool,
}

impl Default for Requirement {
    fn default() -> Self {
        Self::new(RequirementMode::default())
    }
}

impl Requirement {
    pub fn new(mode: RequirementMode) -> Self {
        Self {
            mode,
            required: Vec::new(),
            blocked: Vec::new(),
            conditions: Vec::new(),
            exact_required: false,
            exact_blocked: false,
            ignore_if_empty: true,
        }
    }

    /// `RequireAll` over `tags`.
    pub fn all(tags: impl IntoIterator<Item = TagId>) -> Self {
        Self::new(RequirementMode::RequireAll).with_required_tags(tags)
    }

    /// `RequireAny` over `tags`.
    pub fn any(tags: impl IntoIterator<Item = TagId>) -> Self {
        Self::new(RequirementMode::RequireAny).with_required_tags(tags)
    }

    /// `RequireNone` over `tags`.
    pub fn none(tags: impl IntoIterator<Item = TagId>) -> Self {
        Self::new(RequirementMode::RequireNone).with_required_tags(tags)
    }

    /// Empty tags are dropped with a warning.
    pub fn with_required(mut self, tag: TagId) -> Self {
        if accept(&tag, "required") {
            self.required.push(tag);
        }
        self
    }

    pub fn with_required_tags(self, tags: impl IntoIterator<Item = TagId>) -> Self {
        tags.into_iter().fold(self, Self::with_required)
    }

    /// Empty tags are dropped with a warning.
    pub fn with_blocked(mut self, tag: TagId) -> Self {
        if accept(&tag, "blocked") {
            self.blocked.push(tag);
        }
        self
    }

    pub fn with_blocked_tags(self, tags: impl IntoIterator<Item = TagId>) -> Self {
        tags.into_iter().fold(self, Self::with_blocked)
    }

    /// Conditions on the empty tag are dropped with a warning.
    pub fn with_condition(mut self, condition: TagCondition) -> Self {
        if accept(&condition.tag, "condition") {
            self.conditions.push(condition);
        }
        self
    }

    pub fn with_mode(mut self, mode: RequirementMode) -> Self {
        self.mode = mode;
        self
    }

    /// Match required tags exactly instead of hierarchically.
    pub fn exact_required(mut self, exact: bool) -> Self {
        self.exact_required = exact;
        self
    }

    /// Match blocked tags exactly instead of hierarchically.
    pub fn exact_blocked(mut self, exact: bool) -> Self {
        self.exact_blocked = exact;
        self
    }

    /// Answer returned when there is nothing to check. Defaults to `true`.
    pub fn ignore_if_empty(mut self, pass: bool) -> Self {
        self.ignore_if_empty = pass;
        self
    }

    pub fn mode(&self) -> RequirementMode {
        self.mode
    }

    pub fn required(&self) -> &[TagId] {
        &self.required
    }

    pub fn blocked(&self) -> &[TagId] {
        &self.blocked
    }

    pub fn conditions(&self) -> &[TagCondition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.blocked.is_empty() && self.conditions.is_empty()
    }

    /// Evaluate and report the first reason for failure.
    pub fn check(&self, container: &TagContainer) -> Result<(), Unmet> {
        if self.is_empty() {
            return if self.ignore_if_empty {
                Ok(())
            } else {
                Err(Unmet::EmptyRejected)
            };
        }

        if let Some(tag) = self
            .blocked
            .iter()
            .find(|tag| holds(container, tag, self.exact_blocked))
        {
            return Err(Unmet::Blocked(tag.clone()));
        }

        if let Some(condition) = self.conditions.iter().find(|c| !c.is_met_by(container)) {
            return Err(Unmet::Condition(condition.clone()));
        }

        let held = |tag: &&TagId| holds(container, tag, self.exact_required);
        match self.mode {
            RequirementMode::RequireAll => match self.required.iter().find(|tag| !held(tag)) {
                Some(tag) => Err(Unmet::Missing(tag.clone())),
                None => Ok(()),
            },
            RequirementMode::RequireAny => {
                if self.required.is_empty() || self.required.iter().any(|tag| held(&tag)) {
                    Ok(())
                } else {
                    Err(Unmet::NoneHeld)
                }
            }
            RequirementMode::RequireNone => match self.required.iter().find(held) {
                Some(tag) => Err(Unmet::Forbidden(tag.clone())),
                None => Ok(()),
            },
        }
    }

    pub fn is_satisfied_by(&self, container: &TagContainer) -> bool {
        match self.check(container) {
            Ok(()) => true,
            Err(reason) => {
                tracing::debug!(%reason, "requirement not met");
                false
            }
        }
    }

    /// Required tags the container lacks, in declaration order. Independent
    /// of the mode, so mainly meaningful for `RequireAll`.
    pub fn missing_tags(&self, container: &TagContainer) -> Vec<TagId> {
        self.required
            .iter()
            .filter(|tag| !holds(container, tag, self.exact_required))
            .cloned()
            .collect()
    }

    /// Blocked tags the container currently holds, in declaration order.
    pub fn blocking_tags(&self, container: &TagContainer) -> Vec<TagId> {
        self.blocked
            .iter()
            .filter(|tag| holds(container, tag, self.exact_blocked))
            .cloned()
            .collect()
    }
}

impl TagPredicate for Requirement {
    fn is_satisfied_by(&self, container: &TagContainer) -> bool {
        Requirement::is_satisfied_by(self, container)
    }
}

fn holds(container: &TagContainer, tag: &TagId, exact: bool) -> bool {
    if exact {
        container.has_exact(tag)
    } else {
        container.has_matching(tag)
    }
}

fn accept(tag: &TagId, role: &str) -> bool {
    if tag.is_empty() {
        tracing::warn!(role, "ignoring empty tag in requirement");
        return false;
    }
    true
}
