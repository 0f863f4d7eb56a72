//! `TagContainer`: the tags one entity currently holds, with stack counts.
//!
//! Each tag maps to a positive count; a tag whose count drops to zero is
//! removed outright. Mutations notify registered listeners synchronously, in
//! the order they were subscribed:
//!
//! - `add`: [`TagEvent::Added`] on the 0→1 transition, then
//!   [`TagEvent::CountChanged`]
//! - `remove`: [`TagEvent::Removed`] on the 1→0 transition, then
//!   [`TagEvent::CountChanged`]
//! - `clear`: a single [`TagEvent::Cleared`]
//!
//! Listeners only ever see the event, never the container. A listener must not
//! reach back into the container it observes: one that captures the
//! `Arc<Mutex<TagContainer>>` owning it compiles, but deadlocks on the re-lock
//! because the mutating call still holds that lock. Queue follow-up changes
//! from the listener and apply them once the mutating call has returned.

use std::collections::HashMap;
use std::fmt;

use bevy::prelude::Component;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::requirement::TagPredicate;
use crate::tag::TagId;

/// A change to a [`TagContainer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagEvent<'a> {
    /// The tag went from absent to one stack.
    Added(&'a TagId),
    /// The last stack of the tag was removed.
    Removed(&'a TagId),
    /// Any add or remove; `count` is the stack count afterwards.
    CountChanged { tag: &'a TagId, count: u32 },
    /// The container was emptied by [`TagContainer::clear`].
    Cleared,
}

impl<'a> TagEvent<'a> {
    /// The tag involved, if the event concerns a single tag.
    pub fn tag(&self) -> Option<&'a TagId> {
        match *self {
            Self::Added(tag) | Self::Removed(tag) | Self::CountChanged { tag, .. } => Some(tag),
            Self::Cleared => None,
        }
    }

    /// True for the events an "any change" subscriber cares about.
    pub fn is_change(&self) -> bool {
        matches!(self, Self::CountChanged { .. } | Self::Cleared)
    }
}

/// Handle returned by the `on_*`/`subscribe` methods, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&TagEvent<'_>) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    slots: Vec<(ListenerId, Listener)>,
}

impl Listeners {
    fn push(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.slots.push((id, listener));
        id
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.slots.len();
        self.slots.retain(|(slot, _)| *slot != id);
        self.slots.len() != before
    }

    fn emit(&mut self, event: &TagEvent<'_>) {
        for (_, listener) in &mut self.slots {
            listener(event);
        }
    }
}

/// Stack-counted set of tags held by one entity.
///
/// ```ignore
/// let mut tags = TagContainer::new();
/// tags.add(&registry.register("State.Combat.Attacking"));
///
/// assert!(tags.has_matching(&registry.register("State.Combat")));
/// assert!(!tags.has_exact(&registry.register("State.Combat")));
/// ```
#[derive(Component, Default)]
pub struct TagContainer {
    counts: HashMap<TagId, u32>,
    listeners: Listeners,
}

impl TagContainer {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: add one stack of `tag` and return self.
    #[inline]
    pub fn with(mut self, tag: &TagId) -> Self {
        self.add(tag);
        self
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Add one stack of `tag`. Returns `false` (and changes nothing) for the
    /// empty tag or a tag already at `u32::MAX` stacks.
    pub fn add(&mut self, tag: &TagId) -> bool {
        if tag.is_empty() {
            tracing::warn!("ignoring add of the empty tag");
            return false;
        }

        let count = match self.counts.get_mut(tag) {
            Some(count) => {
                let Some(next) = count.checked_add(1) else {
                    tracing::warn!(tag = %tag, "stack count saturated, ignoring add");
                    return false;
                };
                *count = next;
                next
            }
            None => {
                self.counts.insert(tag.clone(), 1);
                1
            }
        };
        tracing::trace!(tag = %tag, count, "tag stack added");

        if count == 1 {
            self.listeners.emit(&TagEvent::Added(tag));
        }
        self.listeners.emit(&TagEvent::CountChanged { tag, count });
        true
    }

    /// Add `stacks` stacks one at a time, so every unit notifies listeners.
    pub fn add_stacks(&mut self, tag: &TagId, stacks: u32) -> bool {
        let mut changed = false;
        for _ in 0..stacks {
            changed |= self.add(tag);
        }
        changed
    }

    /// Remove one stack of `tag`. Removing an absent tag is a no-op that
    /// returns `false`; counts never go below zero.
    pub fn remove(&mut self, tag: &TagId) -> bool {
        if tag.is_empty() {
            tracing::warn!("ignoring remove of the empty tag");
            return false;
        }
        let Some(count) = self.counts.get_mut(tag) else {
            return false;
        };

        *count -= 1;
        let count = *count;
        tracing::trace!(tag = %tag, count, "tag stack removed");

        if count == 0 {
            self.counts.remove(tag);
            self.listeners.emit(&TagEvent::Removed(tag));
        }
        self.listeners.emit(&TagEvent::CountChanged { tag, count });
        true
    }

    /// Drop every stack of `tag` at once. Returns how many stacks were held.
    pub fn remove_all(&mut self, tag: &TagId) -> u32 {
        let Some(stacks) = self.counts.remove(tag) else {
            return 0;
        };
        tracing::trace!(tag = %tag, stacks, "tag removed");
        self.listeners.emit(&TagEvent::Removed(tag));
        self.listeners
            .emit(&TagEvent::CountChanged { tag, count: 0 });
        stacks
    }

    /// Add every stack held by `other`, one unit at a time.
    pub fn append(&mut self, other: &TagContainer) {
        for (tag, count) in other.iter() {
            self.add_stacks(tag, count);
        }
    }

    /// Remove every stack held by `other`, one unit at a time. Tags this
    /// container holds fewer of simply run out.
    pub fn subtract(&mut self, other: &TagContainer) {
        for (tag, count) in other.iter() {
            for _ in 0..count {
                if !self.remove(tag) {
                    break;
                }
            }
        }
    }

    /// Drop everything. Listeners get exactly one [`TagEvent::Cleared`].
    pub fn clear(&mut self) {
        self.counts.clear();
        self.listeners.emit(&TagEvent::Cleared);
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Is exactly this tag held?
    #[inline]
    pub fn has_exact(&self, tag: &TagId) -> bool {
        self.counts.contains_key(tag)
    }

    /// Is this tag, or any tag below it, held?
    ///
    /// O(1) when the tag itself is held, O(n) otherwise.
    pub fn has_matching(&self, tag: &TagId) -> bool {
        tag.is_valid()
            && (self.counts.contains_key(tag) || self.counts.keys().any(|held| held.is_child_of(tag)))
    }

    /// Does any held tag match the wildcard `pattern`? See
    /// [`TagId::matches_pattern`].
    pub fn has_matching_pattern(&self, pattern: &str) -> bool {
        self.counts.keys().any(|held| held.matches_pattern(pattern))
    }

    /// Every tag held exactly. Vacuously true for no tags.
    pub fn has_all<'a>(&self, tags: impl IntoIterator<Item = &'a TagId>) -> bool {
        tags.into_iter().all(|tag| self.has_exact(tag))
    }

    /// At least one tag held exactly. False for no tags.
    pub fn has_any<'a>(&self, tags: impl IntoIterator<Item = &'a TagId>) -> bool {
        tags.into_iter().any(|tag| self.has_exact(tag))
    }

    /// No tag held exactly. Vacuously true for no tags.
    pub fn has_none<'a>(&self, tags: impl IntoIterator<Item = &'a TagId>) -> bool {
        !self.has_any(tags)
    }

    /// Hierarchical counterpart of [`TagContainer::has_all`].
    pub fn has_all_matching<'a>(&self, tags: impl IntoIterator<Item = &'a TagId>) -> bool {
        tags.into_iter().all(|tag| self.has_matching(tag))
    }

    /// Hierarchical counterpart of [`TagContainer::has_any`].
    pub fn has_any_matching<'a>(&self, tags: impl IntoIterator<Item = &'a TagId>) -> bool {
        tags.into_iter().any(|tag| self.has_matching(tag))
    }

    /// Current stack count, 0 when absent.
    #[inline]
    pub fn stack_count(&self, tag: &TagId) -> u32 {
        self.counts.get(tag).copied().unwrap_or(0)
    }

    /// Number of distinct tags held.
    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all stack counts.
    pub fn total_stacks(&self) -> u64 {
        self.counts.values().map(|&count| u64::from(count)).sum()
    }

    /// Held tags with their counts, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&TagId, u32)> + '_ {
        self.counts.iter().map(|(tag, &count)| (tag, count))
    }

    pub fn tags(&self) -> impl Iterator<Item = &TagId> + '_ {
        self.counts.keys()
    }

    /// Held tags that are `ancestor` or lie below it.
    pub fn matching<'a>(&'a self, ancestor: &'a TagId) -> impl Iterator<Item = &'a TagId> + 'a {
        self.counts.keys().filter(move |held| held.matches(ancestor))
    }

    /// Evaluate a requirement against this container.
    #[inline]
    pub fn satisfies<P: TagPredicate + ?Sized>(&self, predicate: &P) -> bool {
        predicate.is_satisfied_by(self)
    }

    // -------------------------------------------------------------------------
    // Set operations (stack-count semantics, no listeners on the result)
    // -------------------------------------------------------------------------

    /// Tags from both containers; counts add up.
    pub fn union(&self, other: &TagContainer) -> TagContainer {
        let mut counts = self.counts.clone();
        for (tag, count) in other.iter() {
            let slot = counts.entry(tag.clone()).or_insert(0);
            *slot = slot.saturating_add(count);
        }
        Self::from_counts(counts)
    }

    /// Tags held by both; each keeps the smaller of the two counts.
    pub fn intersection(&self, other: &TagContainer) -> TagContainer {
        let counts = self
            .iter()
            .filter_map(|(tag, count)| {
                let shared = count.min(other.stack_count(tag));
                (shared > 0).then(|| (tag.clone(), shared))
            })
            .collect();
        Self::from_counts(counts)
    }

    /// Stacks of `self` left after taking away those of `other`.
    pub fn difference(&self, other: &TagContainer) -> TagContainer {
        let counts = self
            .iter()
            .filter_map(|(tag, count)| {
                let left = count.saturating_sub(other.stack_count(tag));
                (left > 0).then(|| (tag.clone(), left))
            })
            .collect();
        Self::from_counts(counts)
    }

    fn from_counts(counts: HashMap<TagId, u32>) -> Self {
        Self {
            counts,
            listeners: Listeners::default(),
        }
    }

    // -------------------------------------------------------------------------
    // Listeners
    // -------------------------------------------------------------------------

    /// Receive every [`TagEvent`].
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&TagEvent<'_>) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener))
    }

    /// Called when a tag goes from absent to present.
    pub fn on_added<F>(&mut self, mut listener: F) -> ListenerId
    where
        F: FnMut(&TagId) + Send + Sync + 'static,
    {
        self.subscribe(move |event| {
            if let TagEvent::Added(tag) = event {
                listener(tag);
            }
        })
    }

    /// Called when the last stack of a tag goes away.
    pub fn on_removed<F>(&mut self, mut listener: F) -> ListenerId
    where
        F: FnMut(&TagId) + Send + Sync + 'static,
    {
        self.subscribe(move |event| {
            if let TagEvent::Removed(tag) = event {
                listener(tag);
            }
        })
    }

    /// Called once per add, remove or clear.
    pub fn on_any_changed<F>(&mut self, mut listener: F) -> ListenerId
    where
        F: FnMut() + Send + Sync + 'static,
    {
        self.subscribe(move |event| {
            if event.is_change() {
                listener();
            }
        })
    }

    /// Returns `false` if the id was unknown.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.slots.len()
    }
}

/// Clones the stacks only; listeners stay with the original.
impl Clone for TagContainer {
    fn clone(&self) -> Self {
        Self::from_counts(self.counts.clone())
    }
}

/// Compares stacks only.
impl PartialEq for TagContainer {
    fn eq(&self, other: &Self) -> bool {
        self.counts == other.counts
    }
}

impl Eq for TagContainer {}

impl fmt::Debug for TagContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stacks: Vec<_> = self.iter().collect();
        stacks.sort_unstable();
        f.debug_struct("TagContainer")
            .field("stacks", &stacks)
            .field("listeners", &self.listeners.slots.len())
            .finish()
    }
}

impl FromIterator<TagId> for TagContainer {
    fn from_iter<T: IntoIterator<Item = TagId>>(iter: T) -> Self {
        let mut container = Self::new();
        container.extend(iter);
        container
    }
}

impl Extend<TagId> for TagContainer {
    fn extend<T: IntoIterator<Item = TagId>>(&mut self, iter: T) {
        for tag in iter {
            self.add(&tag);
        }
    }
}

/// Serialized as `[(path, count), ...]`, sorted by path.
impl Serialize for TagContainer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut stacks: Vec<(&TagId, u32)> = self.iter().collect();
        stacks.sort_unstable();
        serializer.collect_seq(stacks)
    }
}

impl<'de> Deserialize<'de> for TagContainer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stacks = Vec::<(TagId, u32)>::deserialize(deserializer)?;
        let mut counts: HashMap<TagId, u32> = HashMap::with_capacity(stacks.len());
        for (tag, count) in stacks.into_iter().filter(|(_, count)| *count > 0) {
            let slot = counts.entry(tag).or_insert(0);
            *slot = slot.saturating_add(count);
        }
        Ok(Self::from_counts(counts))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    fn tag(path: &str) -> TagId {
        TagId::parse(path).unwrap()
    }

    /// Records events as short strings, e.g. `+State.Dead`, `State.Dead=1`.
    fn record(container: &mut TagContainer) -> Arc<Mutex<Vec<String>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        container.subscribe(move |event| {
            let line = match event {
                TagEvent::Added(t) => format!("+{t}"),
                TagEvent::Removed(t) => format!("-{t}"),
                TagEvent::CountChanged { tag, count } => format!("{tag}={count}"),
                TagEvent::Cleared => "clear".to_owned(),
            };
            sink.lock().push(line);
        });
        log
    }

    #[test]
    fn add_counts_stacks_and_fires_added_once() {
        let mut tags = TagContainer::new();
        let log = record(&mut tags);
        let dead = tag("State.Dead");

        assert!(tags.add(&dead));
        assert!(tags.add(&dead));
        assert_eq!(tags.stack_count(&dead), 2);
        assert!(tags.has_exact(&dead));
        assert_eq!(*log.lock(), ["+State.Dead", "State.Dead=1", "State.Dead=2"]);
    }

    #[test]
    fn remove_fires_removed_at_zero_and_never_goes_negative() {
        let mut tags = TagContainer::new();
        let stunned = tag("Status.Stunned");
        tags.add_stacks(&stunned, 2);
        let log = record(&mut tags);

        assert!(tags.remove(&stunned));
        assert!(tags.has_exact(&stunned));
        assert!(tags.remove(&stunned));
        assert!(!tags.has_exact(&stunned));
        assert!(!tags.remove(&stunned));
        assert_eq!(tags.stack_count(&stunned), 0);
        assert!(tags.is_empty());
        assert_eq!(
            *log.lock(),
            ["Status.Stunned=1", "-Status.Stunned", "Status.Stunned=0"]
        );
    }

    #[test]
    fn empty_tag_is_refused() {
        let mut tags = TagContainer::new();
        let log = record(&mut tags);
        assert!(!tags.add(&TagId::EMPTY));
        assert!(!tags.remove(&TagId::EMPTY));
        assert!(!tags.has_exact(&TagId::EMPTY));
        assert!(!tags.has_matching(&TagId::EMPTY));
        assert!(tags.is_empty());
        assert!(log.lock().is_empty());
    }

    #[test]
    fn exact_versus_matching() {
        let tags = TagContainer::new().with(&tag("State.Combat.Attacking"));

        assert!(tags.has_exact(&tag("State.Combat.Attacking")));
        assert!(!tags.has_exact(&tag("State.Combat")));
        assert!(tags.has_matching(&tag("State.Combat")));
        assert!(tags.has_matching(&tag("state")));
        assert!(!tags.has_matching(&tag("State.Combat.Attacking.Heavy")));
        assert!(!tags.has_matching(&tag("State.Dead")));
    }

    #[test]
    fn pattern_queries() {
        let tags = TagContainer::new()
            .with(&tag("Ability.Skill.Fireball"))
            .with(&tag("State.CombatZone"));

        assert!(tags.has_matching_pattern("Ability.Skill*"));
        assert!(tags.has_matching_pattern("State.Combat*"));
        assert!(!tags.has_matching_pattern("Status*"));
        assert!(tags.has_matching_pattern("Ability.Skill.Fireball"));
    }

    #[test]
    fn multi_tag_combinators() {
        let (a, b, c) = (tag("A"), tag("B"), tag("C.D"));
        let tags = TagContainer::new().with(&a).with(&b).with(&c);

        assert!(tags.has_all([&a, &b]));
        assert!(!tags.has_all([&a, &tag("Z")]));
        assert!(tags.has_all([]));
        assert!(tags.has_any([&tag("Z"), &b]));
        assert!(!tags.has_any([]));
        assert!(tags.has_none([&tag("Z")]));
        assert!(!tags.has_none([&a]));
        assert!(!tags.has_all([&tag("C")]));
        assert!(tags.has_all_matching([&tag("C"), &a]));
        assert!(tags.has_any_matching([&tag("C"), &tag("Z")]));
    }

    #[test]
    fn matching_lists_held_subtree() {
        let tags = TagContainer::new()
            .with(&tag("State.Combat"))
            .with(&tag("State.Combat.Attacking"))
            .with(&tag("Status.Stunned"));
        let combat = tag("State.Combat");

        let mut held: Vec<_> = tags.matching(&combat).map(TagId::as_str).collect();
        held.sort_unstable();
        assert_eq!(held, ["State.Combat", "State.Combat.Attacking"]);
    }

    #[test]
    fn append_and_subtract_replay_units() {
        let burning = tag("Status.Burning");
        let mut source = TagContainer::new();
        source.add_stacks(&burning, 3);

        let mut target = TagContainer::new();
        let log = record(&mut target);
        target.append(&source);
        assert_eq!(target.stack_count(&burning), 3);
        assert_eq!(
            *log.lock(),
            ["+Status.Burning", "Status.Burning=1", "Status.Burning=2", "Status.Burning=3"]
        );

        log.lock().clear();
        let mut more = source.clone();
        more.add(&burning);
        target.subtract(&more);
        assert_eq!(target.stack_count(&burning), 0);
        assert_eq!(
            *log.lock(),
            ["Status.Burning=2", "Status.Burning=1", "-Status.Burning", "Status.Burning=0"]
        );
    }

    #[test]
    fn remove_all_drops_every_stack() {
        let shield = tag("Buff.Shield");
        let mut tags = TagContainer::new();
        tags.add_stacks(&shield, 4);
        let log = record(&mut tags);

        assert_eq!(tags.remove_all(&shield), 4);
        assert_eq!(tags.remove_all(&shield), 0);
        assert!(!tags.has_exact(&shield));
        assert_eq!(*log.lock(), ["-Buff.Shield", "Buff.Shield=0"]);
    }

    #[test]
    fn clear_fires_exactly_once() {
        let mut tags = TagContainer::new().with(&tag("A")).with(&tag("B"));
        let changes = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&changes);
        tags.on_any_changed(move || *sink.lock() += 1);

        tags.clear();
        assert!(tags.is_empty());
        assert_eq!(*changes.lock(), 1);
    }

    #[test]
    fn typed_listeners_and_unsubscribe() {
        let mut tags = TagContainer::new();
        let added = Arc::new(Mutex::new(Vec::new()));
        let removed = Arc::new(Mutex::new(Vec::new()));
        let (a, r) = (Arc::clone(&added), Arc::clone(&removed));
        let added_id = tags.on_added(move |t| a.lock().push(t.to_string()));
        tags.on_removed(move |t| r.lock().push(t.to_string()));
        assert_eq!(tags.listener_count(), 2);

        let dead = tag("State.Dead");
        tags.add(&dead);
        tags.add(&dead);
        tags.remove(&dead);
        tags.remove(&dead);
        assert_eq!(*added.lock(), ["State.Dead"]);
        assert_eq!(*removed.lock(), ["State.Dead"]);

        assert!(tags.unsubscribe(added_id));
        assert!(!tags.unsubscribe(added_id));
        tags.add(&dead);
        assert_eq!(added.lock().len(), 1);
    }

    #[test]
    fn clone_keeps_stacks_but_not_listeners() {
        let mut tags = TagContainer::new().with(&tag("A"));
        tags.on_any_changed(|| {});
        let copy = tags.clone();
        assert_eq!(copy, tags);
        assert_eq!(copy.listener_count(), 0);
    }

    #[test]
    fn set_operations_use_stack_counts() {
        let (a, b, c) = (tag("A"), tag("B"), tag("C"));
        let mut left = TagContainer::new();
        left.add_stacks(&a, 3);
        left.add_stacks(&b, 1);
        let mut right = TagContainer::new();
        right.add_stacks(&a, 1);
        right.add_stacks(&c, 2);

        let union = left.union(&right);
        assert_eq!(union.stack_count(&a), 4);
        assert_eq!(union.stack_count(&b), 1);
        assert_eq!(union.stack_count(&c), 2);

        let both = left.intersection(&right);
        assert_eq!(both.len(), 1);
        assert_eq!(both.stack_count(&a), 1);

        let only_left = left.difference(&right);
        assert_eq!(only_left.stack_count(&a), 2);
        assert_eq!(only_left.stack_count(&b), 1);
        assert!(!only_left.has_exact(&c));

        assert!(right.difference(&union).is_empty());
    }

    #[test]
    fn totals_and_iteration() {
        let mut tags = TagContainer::new();
        tags.add_stacks(&tag("A"), 2);
        tags.add_stacks(&tag("B.C"), 3);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.total_stacks(), 5);
        let mut pairs: Vec<_> = tags.iter().map(|(t, n)| (t.as_str(), n)).collect();
        pairs.sort_unstable();
        assert_eq!(pairs, [("A", 2), ("B.C", 3)]);
    }

    #[test]
    fn collect_and_extend_add_one_stack_each() {
        let mut tags: TagContainer = [tag("A"), tag("A"), tag("B")].into_iter().collect();
        tags.extend([tag("B")]);
        assert_eq!(tags.stack_count(&tag("A")), 2);
        assert_eq!(tags.stack_count(&tag("B")), 2);
    }

    #[test]
    fn serde_as_sorted_pairs() {
        let mut tags = TagContainer::new();
        tags.add_stacks(&tag("Status.Stunned"), 2);
        tags.add(&tag("State.Dead"));

        let json = serde_json::to_string(&tags).unwrap();
        assert_eq!(json, r#"[["State.Dead",1],["Status.Stunned",2]]"#);

        let back: TagContainer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tags);

        let skipped: TagContainer = serde_json::from_str(r#"[["A",0],["B",1],["b",2]]"#).unwrap();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped.stack_count(&tag("B")), 3);
        assert!(serde_json::from_str::<TagContainer>(r#"[["A..B",1]]"#).is_err());
    }

    #[test]
    fn add_at_max_stacks_is_refused() {
        let mut tags: TagContainer = serde_json::from_str(r#"[["Status.Poisoned",4294967295]]"#).unwrap();
        let poisoned = tag("Status.Poisoned");
        let log = record(&mut tags);

        assert!(!tags.add(&poisoned));
        assert!(!tags.add_stacks(&poisoned, 3));
        assert_eq!(tags.stack_count(&poisoned), u32::MAX);
        assert!(log.lock().is_empty());

        assert!(tags.remove(&poisoned));
        assert!(tags.add(&poisoned));
        assert_eq!(tags.stack_count(&poisoned), u32::MAX);
    }

    #[test]
    fn tags_deeper_than_the_gid_are_held() {
        let nine = tag("A.B.C.D.E.F.G.H.I");
        let eight = nine.parent();
        let twelve = tag("A.B.C.D.E.F.G.H.I.J.K.L");
        let mut tags = TagContainer::new();

        assert!(tags.add(&nine));
        assert!(tags.add(&twelve));
        assert!(tags.has_exact(&nine));
        assert!(tags.has_exact(&twelve));
        assert!(!tags.has_exact(&eight));
        assert!(tags.has_matching(&eight));
        assert!(!tags.has_matching(&tag("A.B.C.D.E.F.G.H.X")));
        assert_eq!(tags.len(), 2);

        assert!(tags.remove(&nine));
        assert!(!tags.has_exact(&nine));
        assert!(tags.has_matching(&nine));
    }

    #[test]
    fn listeners_queue_follow_up_changes() {
        let mut tags = TagContainer::new();
        let queued = Arc::new(Mutex::new(Vec::<TagId>::new()));
        {
            let queued = Arc::clone(&queued);
            tags.on_added(move |added| {
                if added.as_str() == "State.Dead" {
                    queued.lock().push(TagId::new("Status.Ragdoll"));
                }
            });
        }

        tags.add(&tag("State.Dead"));
        let follow_ups: Vec<TagId> = queued.lock().drain(..).collect();
        for follow_up in &follow_ups {
            tags.add(follow_up);
        }

        assert!(tags.has_exact(&tag("Status.Ragdoll")));
        assert!(queued.lock().is_empty());
    }
}
