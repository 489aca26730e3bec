//! Cache Store Module
//!
//! Insertion-ordered doubly linked list of entries, kept in an arena.
//!
//! Entries live in a `Vec` of slots and link to each other through
//! [`EntryId`] handles instead of references. Freed slots are recycled
//! through a free list; every free bumps the slot's generation so stale
//! handles are detected instead of aliasing a newer entry.
//!
//! The store does no locking of its own. Callers hold the engine lock.

use crate::cache::{Entry, EntryId};

#[derive(Debug)]
struct Slot {
    generation: u64,
    entry: Option<Entry>,
}

// == Store ==
/// Doubly linked list of entries, most recently inserted at the head.
///
/// Keys are not deduplicated: several entries may share a key.
#[derive(Debug, Default)]
pub struct Store {
    slots: Vec<Slot>,
    free: Vec<usize>,
    head: Option<EntryId>,
    tail: Option<EntryId>,
}

impl Store {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently inserted entry.
    pub fn head(&self) -> Option<EntryId> {
        self.head
    }

    /// Oldest inserted entry.
    pub fn tail(&self) -> Option<EntryId> {
        self.tail
    }

    /// Returns true if no entries are linked.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Returns the entry behind `id`, or `None` if the handle is stale.
    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    fn get_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    // == Insert Front ==
    /// Links `entry` in as the new head. O(1).
    ///
    /// Any links already set on `entry` are overwritten.
    pub fn insert_front(&mut self, mut entry: Entry) -> EntryId {
        entry.prev = None;
        entry.next = self.head;

        let id = self.alloc(entry);

        match self.head {
            Some(old_head) => {
                if let Some(old) = self.get_mut(old_head) {
                    old.prev = Some(id);
                }
            }
            None => self.tail = Some(id),
        }
        self.head = Some(id);

        id
    }

    fn alloc(&mut self, entry: Entry) -> EntryId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.entry = Some(entry);
                EntryId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len();
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                EntryId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    // == Remove ==
    /// Unlinks the entry behind `id` and returns it. O(1).
    ///
    /// Head, tail and both neighbours are repaired. A stale handle
    /// (already removed) returns `None` and leaves the store untouched.
    pub fn remove(&mut self, id: EntryId) -> Option<Entry> {
        let slot = self.slots.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        let mut entry = slot.entry.take()?;
        slot.generation += 1;
        self.free.push(id.index);

        match entry.prev {
            Some(prev) => {
                if let Some(p) = self.get_mut(prev) {
                    p.next = entry.next;
                }
            }
            None => self.head = entry.next,
        }
        match entry.next {
            Some(next) => {
                if let Some(n) = self.get_mut(next) {
                    n.prev = entry.prev;
                }
            }
            None => self.tail = entry.prev,
        }

        entry.prev = None;
        entry.next = None;
        Some(entry)
    }

    // == Count ==
    /// Counts linked entries by walking the list. O(n).
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    // == Find All ==
    /// Lazily yields handles of entries whose key equals `key`, head to tail.
    ///
    /// Calling it again restarts the scan from the head.
    pub fn find_all<'a>(&'a self, key: &'a [u8]) -> FindAll<'a> {
        FindAll {
            store: self,
            cursor: Matches::new(self, key),
        }
    }

    /// Detached form of [`find_all`](Self::find_all): the cursor does not
    /// borrow the store, so the entry it just yielded may be removed before
    /// advancing again.
    pub fn matches<'k>(&self, key: &'k [u8]) -> Matches<'k> {
        Matches::new(self, key)
    }

    /// Iterates head to tail (newest first).
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            store: self,
            next: self.head,
            forward: true,
        }
    }

    /// Iterates tail to head (oldest first).
    pub fn iter_rev(&self) -> Iter<'_> {
        Iter {
            store: self,
            next: self.tail,
            forward: false,
        }
    }

    // == Link Check ==
    /// Verifies that the forward and backward chains visit the same entries,
    /// that every neighbour pair points at each other, and that no occupied
    /// slot is unreachable.
    pub fn links_consistent(&self) -> bool {
        let limit = self.slots.len();

        let mut forward = Vec::new();
        let mut prev: Option<EntryId> = None;
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let Some(entry) = self.get(id) else {
                return false;
            };
            if entry.prev != prev || forward.len() >= limit {
                return false;
            }
            forward.push(id);
            prev = Some(id);
            cursor = entry.next;
        }
        if prev != self.tail {
            return false;
        }

        let mut backward = Vec::with_capacity(forward.len());
        let mut cursor = self.tail;
        while let Some(id) = cursor {
            let Some(entry) = self.get(id) else {
                return false;
            };
            if backward.len() >= limit {
                return false;
            }
            backward.push(id);
            cursor = entry.prev;
        }
        backward.reverse();

        let occupied = self.slots.iter().filter(|s| s.entry.is_some()).count();
        forward == backward && occupied == forward.len()
    }
}

// == Iterators ==
/// Walks the list in one direction, yielding handles with their entries.
pub struct Iter<'a> {
    store: &'a Store,
    next: Option<EntryId>,
    forward: bool,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (EntryId, &'a Entry);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let entry = self.store.get(id)?;
        self.next = if self.forward { entry.next } else { entry.prev };
        Some((id, entry))
    }
}

/// Cursor over entries matching a key, head to tail.
///
/// The successor is captured before a match is yielded, so removing the
/// yielded entry does not break the scan.
#[derive(Debug, Clone)]
pub struct Matches<'k> {
    key: &'k [u8],
    next: Option<EntryId>,
}

impl<'k> Matches<'k> {
    fn new(store: &Store, key: &'k [u8]) -> Self {
        Self {
            key,
            next: store.head,
        }
    }

    /// Advances to the next matching entry in `store`.
    pub fn next_in(&mut self, store: &Store) -> Option<EntryId> {
        while let Some(id) = self.next {
            let entry = store.get(id)?;
            self.next = entry.next;
            if entry.key.as_ref() == self.key {
                return Some(id);
            }
        }
        None
    }
}

/// Borrowing iterator returned by [`Store::find_all`].
pub struct FindAll<'a> {
    store: &'a Store,
    cursor: Matches<'a>,
}

impl<'a> Iterator for FindAll<'a> {
    type Item = EntryId;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.next_in(self.store)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::time::{Duration, Instant};

    fn entry(key: &'static str, value: &'static str) -> Entry {
        Entry::new(
            Bytes::from_static(key.as_bytes()),
            Bytes::from_static(value.as_bytes()),
            Duration::from_secs(60),
            Instant::now(),
        )
    }

    fn values(store: &Store) -> Vec<Bytes> {
        store.iter().map(|(_, e)| e.value.clone()).collect()
    }

    #[test]
    fn test_store_new() {
        let store = Store::new();
        assert!(store.is_empty());
        assert_eq!(store.count(), 0);
        assert!(store.head().is_none());
        assert!(store.tail().is_none());
        assert!(store.links_consistent());
    }

    #[test]
    fn test_insert_into_empty_sets_head_and_tail() {
        let mut store = Store::new();
        let id = store.insert_front(entry("a", "1"));

        assert_eq!(store.head(), Some(id));
        assert_eq!(store.tail(), Some(id));
        assert_eq!(store.count(), 1);
        assert!(store.links_consistent());
    }

    #[test]
    fn test_insert_front_orders_newest_first() {
        let mut store = Store::new();
        let first = store.insert_front(entry("a", "1"));
        store.insert_front(entry("b", "2"));
        let last = store.insert_front(entry("c", "3"));

        assert_eq!(store.head(), Some(last));
        assert_eq!(store.tail(), Some(first));
        assert_eq!(values(&store), vec!["3", "2", "1"]);

        let reversed: Vec<Bytes> = store.iter_rev().map(|(_, e)| e.value.clone()).collect();
        assert_eq!(reversed, vec!["1", "2", "3"]);
        assert!(store.links_consistent());
    }

    #[test]
    fn test_remove_head_middle_tail() {
        let mut store = Store::new();
        let a = store.insert_front(entry("a", "1"));
        let b = store.insert_front(entry("b", "2"));
        let c = store.insert_front(entry("c", "3"));
        let d = store.insert_front(entry("d", "4"));

        // middle
        assert_eq!(store.remove(b).unwrap().value, "2");
        assert_eq!(values(&store), vec!["4", "3", "1"]);
        assert!(store.links_consistent());

        // head
        store.remove(d).unwrap();
        assert_eq!(store.head(), Some(c));
        assert!(store.links_consistent());

        // tail
        store.remove(a).unwrap();
        assert_eq!(store.tail(), Some(c));
        assert_eq!(store.head(), Some(c));
        assert!(store.links_consistent());

        // last one
        store.remove(c).unwrap();
        assert!(store.is_empty());
        assert!(store.tail().is_none());
        assert!(store.links_consistent());
    }

    #[test]
    fn test_remove_detaches_links() {
        let mut store = Store::new();
        store.insert_front(entry("a", "1"));
        let b = store.insert_front(entry("b", "2"));
        store.insert_front(entry("c", "3"));

        let removed = store.remove(b).unwrap();
        assert!(removed.prev.is_none());
        assert!(removed.next.is_none());
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let mut store = Store::new();
        let old = store.insert_front(entry("a", "1"));
        store.remove(old).unwrap();

        // The freed slot is reused by the next insert.
        let new = store.insert_front(entry("b", "2"));
        assert_eq!(new.index, old.index);
        assert_ne!(new, old);

        assert!(store.get(old).is_none());
        assert!(store.remove(old).is_none());
        assert_eq!(store.get(new).unwrap().value, "2");
        assert_eq!(store.count(), 1);
        assert!(store.links_consistent());
    }

    #[test]
    fn test_find_all_yields_duplicates_newest_first() {
        let mut store = Store::new();
        store.insert_front(entry("k", "old"));
        store.insert_front(entry("other", "x"));
        store.insert_front(entry("k", "new"));

        let found: Vec<Bytes> = store
            .find_all(b"k")
            .map(|id| store.get(id).unwrap().value.clone())
            .collect();
        assert_eq!(found, vec!["new", "old"]);

        // Restartable: a fresh call scans from the head again.
        assert_eq!(store.find_all(b"k").count(), 2);
        assert_eq!(store.find_all(b"missing").count(), 0);
    }

    #[test]
    fn test_find_all_empty_key() {
        let mut store = Store::new();
        store.insert_front(entry("", "empty"));
        store.insert_front(entry("a", "1"));

        let found: Vec<_> = store.find_all(b"").collect();
        assert_eq!(found.len(), 1);
        assert_eq!(store.get(found[0]).unwrap().value, "empty");
    }

    #[test]
    fn test_matches_survives_removal_of_yielded_entry() {
        let mut store = Store::new();
        store.insert_front(entry("k", "1"));
        store.insert_front(entry("k", "2"));
        store.insert_front(entry("k", "3"));

        let mut cursor = store.matches(b"k");
        let mut seen = Vec::new();
        while let Some(id) = cursor.next_in(&store) {
            seen.push(store.remove(id).unwrap().value);
        }

        assert_eq!(seen, vec!["3", "2", "1"]);
        assert!(store.is_empty());
        assert!(store.links_consistent());
    }
}
