//! Tag registry: an interning table for [`TagId`]s.
//!
//! Registering a path hands back the one shared `TagId` for it, so every
//! holder of `State.Combat` points at the same allocation and
//! [`TagId::is_same_instance`] can short-circuit equality.
//!
//! The table sits behind a `parking_lot::RwLock`: lookups share a read lock and
//! registration takes the write lock, so one registry can be handed to several
//! threads. Published tags are immutable and need no locking at all.

use std::cmp::Ordering;
use std::collections::HashMap;

use parking_lot::RwLock;

use crate::GID;
use crate::error::TagError;
use crate::tag::TagId;

/// One registered tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagEntry {
    pub tag: TagId,
    /// False for ancestors created on the way to a deeper path.
    pub is_explicit: bool,
}

#[derive(Debug, Default)]
struct Table {
    /// Deepest registered tag, in segments (0 = empty).
    max_depth: usize,
    entries: Vec<TagEntry>,
    /// Indices into `entries` in registration order. Distinct paths may share
    /// a GID, so a bucket can hold several.
    gid_to_idx: HashMap<GID, Vec<usize>>,
    /// Indices into `entries`: parent before children, siblings alphabetical.
    dfs_order: Vec<usize>,
}

impl Table {
    /// Index of `tag` if registered. The GID picks the bucket, the path
    /// decides.
    fn find(&self, tag: &TagId) -> Option<usize> {
        self.gid_to_idx
            .get(&tag.gid())?
            .iter()
            .copied()
            .find(|&idx| self.entries[idx].tag == *tag)
    }

    fn insert(&mut self, tag: TagId, is_explicit: bool) {
        let idx = self.entries.len();
        self.max_depth = self.max_depth.max(tag.depth());
        self.gid_to_idx.entry(tag.gid()).or_default().push(idx);

        let pos = self
            .dfs_order
            .partition_point(|&other| dfs_cmp(&self.entries[other].tag, &tag) == Ordering::Less);
        self.dfs_order.insert(pos, idx);
        self.entries.push(TagEntry { tag, is_explicit });
    }

    fn in_dfs_order(&self) -> impl Iterator<Item = &TagEntry> + '_ {
        self.dfs_order.iter().map(|&idx| &self.entries[idx])
    }
}

/// Segment-wise comparison: a prefix sorts before its extensions, siblings
/// compare case-folded.
fn dfs_cmp(a: &TagId, b: &TagId) -> Ordering {
    for (x, y) in a.segments().zip(b.segments()) {
        match folded(x).cmp(folded(y)) {
            Ordering::Equal => {}
            unequal => return unequal,
        }
    }
    a.depth().cmp(&b.depth())
}

fn folded(segment: &str) -> impl Iterator<Item = u8> + '_ {
    segment.bytes().map(|b| b.to_ascii_lowercase())
}

/// Interning table mapping tag paths to shared [`TagId`]s.
///
/// Provides:
/// - Idempotent registration with automatic ancestor creation
/// - Path and GID lookup without registering
/// - DFS-ordered snapshots and subtree listing
#[derive(Debug, Default)]
pub struct TagRegistry {
    table: RwLock<Table>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of paths, stopping at the first bad one.
    pub fn from_paths<I, S>(paths: I) -> Result<Self, TagError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let registry = Self::new();
        for path in paths {
            registry.try_register(path.as_ref())?;
        }
        Ok(registry)
    }

    /// Register `name` and return its interned tag.
    ///
    /// Missing ancestors are created as implicit entries; registering an
    /// implicit entry by name marks it explicit. Registering the same path
    /// again, in any letter case, returns the existing instance.
    ///
    /// # Errors
    ///
    /// The path is malformed (see [`TagId::parse`]).
    pub fn try_register(&self, name: &str) -> Result<TagId, TagError> {
        let tag = TagId::parse(name)?;
        let mut table = self.table.write();

        if let Some(idx) = table.find(&tag) {
            let entry = &mut table.entries[idx];
            entry.is_explicit = true;
            return Ok(entry.tag.clone());
        }

        let missing: Vec<TagId> = tag
            .ancestors()
            .take_while(|ancestor| table.find(ancestor).is_none())
            .collect();

        let implicit = missing.len();
        for ancestor in missing.into_iter().rev() {
            table.insert(ancestor, false);
        }
        table.insert(tag.clone(), true);

        tracing::debug!(tag = %tag, implicit, total = table.entries.len(), "registered tag");
        Ok(tag)
    }

    /// Register `name`, logging and returning [`TagId::EMPTY`] on failure.
    pub fn register(&self, name: &str) -> TagId {
        match self.try_register(name) {
            Ok(tag) => tag,
            Err(err) => {
                tracing::warn!(%err, name, "tag registration rejected");
                TagId::EMPTY
            }
        }
    }

    /// Interned tag for `name`, without registering it.
    pub fn get(&self, name: &str) -> Option<TagId> {
        let tag = TagId::parse(name).ok()?;
        self.interned(&tag)
    }

    /// Interned instance equal to `tag`, if registered.
    pub fn interned(&self, tag: &TagId) -> Option<TagId> {
        let table = self.table.read();
        let idx = table.find(tag)?;
        Some(table.entries[idx].tag.clone())
    }

    /// Tag registered under `gid`. When several paths share the GID, the one
    /// registered first wins.
    pub fn get_by_gid(&self, gid: GID) -> Option<TagId> {
        let table = self.table.read();
        let idx = *table.gid_to_idx.get(&gid)?.first()?;
        Some(table.entries[idx].tag.clone())
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[inline]
    pub fn contains_gid(&self, gid: GID) -> bool {
        self.table.read().gid_to_idx.contains_key(&gid)
    }

    /// Total number of registered tags, implicit ancestors included.
    pub fn len(&self) -> usize {
        self.table.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Depth of the deepest registered tag, in segments (0 = empty registry).
    pub fn tree_depth(&self) -> usize {
        self.table.read().max_depth
    }

    /// Snapshot of every entry in DFS order.
    pub fn entries(&self) -> Vec<TagEntry> {
        self.table.read().in_dfs_order().cloned().collect()
    }

    /// Snapshot of every tag in DFS order.
    pub fn tags(&self) -> Vec<TagId> {
        self.table
            .read()
            .in_dfs_order()
            .map(|entry| entry.tag.clone())
            .collect()
    }

    /// Every registered tag strictly below `ancestor`, in DFS order.
    ///
    /// Not O(1), walks all entries.
    pub fn descendants_of(&self, ancestor: &TagId) -> Vec<TagId> {
        self.table
            .read()
            .in_dfs_order()
            .filter(|entry| entry.tag.is_child_of(ancestor))
            .map(|entry| entry.tag.clone())
            .collect()
    }

    /// Registered tags exactly one level below `parent`, in DFS order.
    pub fn children_of(&self, parent: &TagId) -> Vec<TagId> {
        let depth = parent.depth() + 1;
        self.table
            .read()
            .in_dfs_order()
            .filter(|entry| entry.tag.depth() == depth && entry.tag.is_child_of(parent))
            .map(|entry| entry.tag.clone())
            .collect()
    }
}
