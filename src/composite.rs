//! AND/OR combinations of requirements.
//!
//! - `All` stops at the first failing child (short-circuited `&&`)
//! - `Any` stops at the first passing child (short-circuited `||`)
//! - A composite with no children is satisfied

use serde::{Deserialize, Serialize};

use crate::container::TagContainer;
use crate::requirement::{Requirement, TagPredicate, Unmet};

/// How a composite combines its children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    #[default]
    All,
    Any,
}

/// Ordered list of requirements joined by one [`Combinator`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompositeRequirement {
    combinator: Combinator,
    children: Vec<Requirement>,
}

impl CompositeRequirement {
    pub fn new(combinator: Combinator) -> Self {
        Self {
            combinator,
            children: Vec::new(),
        }
    }

    pub fn all(children: impl IntoIterator<Item = Requirement>) -> Self {
        Self::new(Combinator::All).with_all(children)
    }

    pub fn any(children: impl IntoIterator<Item = Requirement>) -> Self {
        Self::new(Combinator::Any).with_all(children)
    }

    /// Builder method: append one child.
    pub fn with(mut self, child: Requirement) -> Self {
        self.children.push(child);
        self
    }

    fn with_all(mut self, children: impl IntoIterator<Item = Requirement>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    pub fn children(&self) -> &[Requirement] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Evaluate, reporting which child failed for `All` and
    /// [`Unmet::NoAlternative`] when every `Any` child failed.
    pub fn check(&self, container: &TagContainer) -> Result<(), Unmet> {
        match self.combinator {
            Combinator::All => {
                for (index, child) in self.children.iter().enumerate() {
                    child.check(container).map_err(|reason| Unmet::Child {
                        index,
                        reason: Box::new(reason),
                    })?;
                }
                Ok(())
            }
            Combinator::Any => {
                if self.children.is_empty()
                    || self.children.iter().any(|child| child.check(container).is_ok())
                {
                    Ok(())
                } else {
                    Err(Unmet::NoAlternative)
                }
            }
        }
    }

    pub fn is_satisfied_by(&self, container: &TagContainer) -> bool {
        self.check(container).is_ok()
    }
}

impl TagPredicate for CompositeRequirement {
    fn is_satisfied_by(&self, container: &TagContainer) -> bool {
        CompositeRequirement::is_satisfied_by(self, container)
    }
}
