//! `TagId`: one hierarchical, dot-separated gameplay tag.
//!
//! A tag keeps its canonical path (segments trimmed, original casing kept for
//! display) next to its GID. Equality, hashing and ordering all fold ASCII
//! case; the GID decides most comparisons on its own and the path text is only
//! consulted to confirm a hit.
//!
//! Malformed input never panics. [`TagId::parse`] reports why, while
//! [`TagId::new`] logs and hands back [`TagId::EMPTY`], which matches nothing.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::GID;
use crate::error::TagError;
use crate::hash::path_gid;
use crate::layout::{EMPTY_GID, MAX_DEPTH, gid_is_descendant_of, truncate_to};

/// Hierarchical tag such as `State.Combat.Attacking`.
///
/// Cloning is cheap: the path is shared behind an `Arc`. Tags handed out by a
/// [`TagRegistry`](crate::TagRegistry) share one allocation per path, which
/// [`TagId::is_same_instance`] exposes.
///
/// Only the first [`MAX_DEPTH`] segments are hashed into the GID, so a deeper
/// tag shares its GID with its 8-segment ancestor and the path text tells the
/// two apart.
#[derive(Clone)]
pub struct TagId {
    gid: GID,
    depth: usize,
    name: Option<Arc<str>>,
}

impl TagId {
    /// The invalid/empty tag. Never a parent, child or match of anything.
    pub const EMPTY: TagId = TagId {
        gid: EMPTY_GID,
        depth: 0,
        name: None,
    };

    /// Parse a dotted path, trimming whitespace around every segment.
    ///
    /// ```text
    /// " State . Combat "  → Ok(State.Combat)
    /// "State..Combat"     → Err(EmptySegment)
    /// "State.Combat."     → Err(EmptySegment)
    /// ```
    pub fn parse(input: &str) -> Result<Self, TagError> {
        if input.trim().is_empty() {
            return Err(TagError::Empty);
        }

        let mut canonical = String::with_capacity(input.len());
        let mut depth = 0usize;
        for raw in input.split('.') {
            let segment = raw.trim();
            if segment.is_empty() {
                return Err(TagError::EmptySegment {
                    input: input.to_owned(),
                });
            }
            if depth > 0 {
                canonical.push('.');
            }
            canonical.push_str(segment);
            depth += 1;
        }

        let gid = path_gid(canonical.split('.')).ok_or(TagError::Empty)?;
        Ok(Self::from_parts(gid, &canonical, depth))
    }

    /// Parse a path, falling back to [`TagId::EMPTY`] with a warning.
    pub fn new(input: &str) -> Self {
        match Self::parse(input) {
            Ok(tag) => tag,
            Err(err) => {
                tracing::warn!(%err, "malformed tag, using the empty tag");
                Self::EMPTY
            }
        }
    }

    fn from_parts(gid: GID, name: &str, depth: usize) -> Self {
        Self {
            gid,
            depth,
            name: Some(Arc::from(name)),
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.name.is_some()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }

    #[inline]
    pub fn gid(&self) -> GID {
        self.gid
    }

    /// Canonical path; `""` for the empty tag.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Number of segments (`A.B.C` → 3, empty tag → 0).
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> + '_ {
        self.name.as_deref().into_iter().flat_map(|name| name.split('.'))
    }

    pub fn segment(&self, index: usize) -> Option<&str> {
        self.segments().nth(index)
    }

    /// True when both handles point at the same interned path.
    #[inline]
    pub fn is_same_instance(&self, other: &TagId) -> bool {
        match (&self.name, &other.name) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Strictly below `parent`: `State.Combat.Attacking` is a child of
    /// `State.Combat` and of `State`, but not of itself.
    pub fn is_child_of(&self, parent: &TagId) -> bool {
        let (Some(name), Some(parent_name)) = (self.name.as_deref(), parent.name.as_deref()) else {
            return false;
        };
        if parent.depth() >= self.depth() || !gid_is_descendant_of(self.gid, parent.gid) {
            return false;
        }
        let (bytes, prefix) = (name.as_bytes(), parent_name.as_bytes());
        bytes.len() > prefix.len()
            && bytes[prefix.len()] == b'.'
            && bytes[..prefix.len()].eq_ignore_ascii_case(prefix)
    }

    /// `self` is `other` or lies below it. Directional:
    /// `Ability.Skill.Fireball` matches `Ability.Skill`, not the reverse.
    #[inline]
    pub fn matches(&self, other: &TagId) -> bool {
        self.is_valid() && (self == other || self.is_child_of(other))
    }

    /// Wildcard match on the raw path text.
    ///
    /// A trailing `*` makes the rest a literal, case-insensitive prefix of the
    /// path, not a segment prefix: `State.Combat*` also matches
    /// `State.CombatZone`. Without `*` the pattern must equal the path.
    pub fn matches_pattern(&self, pattern: &str) -> bool {
        let Some(name) = self.name.as_deref() else {
            return false;
        };
        let pattern = pattern.trim();
        match pattern.strip_suffix('*') {
            Some(prefix) => {
                name.len() >= prefix.len()
                    && name.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
            }
            None => name.eq_ignore_ascii_case(pattern),
        }
    }

    /// Tag with the last segment removed; top-level tags yield [`TagId::EMPTY`].
    pub fn parent(&self) -> TagId {
        match self.depth {
            0 | 1 => Self::EMPTY,
            depth => self.truncate(depth - 1),
        }
    }

    /// The first `depth` segments. Returns `self` when it is no deeper than
    /// `depth`, and the empty tag for `depth == 0`.
    pub fn truncate(&self, depth: usize) -> TagId {
        let Some(name) = self.name.as_deref() else {
            return Self::EMPTY;
        };
        if depth == 0 {
            return Self::EMPTY;
        }
        if depth >= self.depth() {
            return self.clone();
        }
        let end = name
            .match_indices('.')
            .nth(depth - 1)
            .map_or(name.len(), |(index, _)| index);
        // Prefixes at or past the last hashed level share this GID.
        let gid = if depth >= MAX_DEPTH {
            Some(self.gid)
        } else {
            truncate_to(self.gid, (depth - 1) as u8)
        };
        match gid {
            Some(gid) => Self::from_parts(gid, &name[..end], depth),
            None => Self::EMPTY,
        }
    }

    /// First segment only.
    #[inline]
    pub fn root(&self) -> TagId {
        self.truncate(1)
    }

    /// Longest shared segment prefix of `a` and `b`, spelled as in `a`.
    /// Tags with different roots have the empty tag as common parent.
    pub fn common_parent(a: &TagId, b: &TagId) -> TagId {
        let shared = a
            .segments()
            .zip(b.segments())
            .take_while(|(x, y)| x.eq_ignore_ascii_case(y))
            .count();
        a.truncate(shared)
    }

    /// Every ancestor from the direct parent up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = TagId> + '_ {
        (1..self.depth()).rev().map(move |depth| self.truncate(depth))
    }

    fn folded_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.as_str().bytes().map(|b| b.to_ascii_lowercase())
    }
}

impl Default for TagId {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl PartialEq for TagId {
    fn eq(&self, other: &Self) -> bool {
        if self.gid != other.gid {
            return false;
        }
        match (&self.name, &other.name) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b) || a.eq_ignore_ascii_case(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl Eq for TagId {}

impl Hash for TagId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.gid.hash(state);
    }
}

impl PartialOrd for TagId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TagId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded_bytes().cmp(other.folded_bytes())
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name.as_deref() {
            Some(name) => write!(f, "TagId({name})"),
            None => f.write_str("TagId(<empty>)"),
        }
    }
}

impl FromStr for TagId {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&str> for TagId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Serialize for TagId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TagId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(D::Error::custom)
    }
}
