//! LRU List Module
//!
//! Recency-ordered set of entries with O(1) lookup, promotion and eviction.

use std::collections::HashMap;

use crate::cache::Entry;

// == Node ==
/// A slot in the arena, linked to its neighbours by index.
#[derive(Debug)]
struct Node<V> {
    entry: Entry<V>,
    prev: Option<usize>,
    next: Option<usize>,
}

// == LRU List ==
/// Doubly linked list of entries stored in an arena, plus a key index.
///
/// - Front (`head`) = Most recently used
/// - Back (`tail`) = Least recently used
///
/// Every key in `index` points at exactly one occupied slot and every occupied
/// slot is reachable from `head`.
#[derive(Debug)]
pub struct LruList<V> {
    slots: Vec<Option<Node<V>>>,
    free: Vec<usize>,
    index: HashMap<String, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl<V> Default for LruList<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> LruList<V> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty list with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            index: HashMap::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    // == Lookup ==
    /// Returns the entry for `key` without changing its position.
    pub fn get(&self, key: &str) -> Option<&Entry<V>> {
        let idx = *self.index.get(key)?;
        self.node(idx).map(|node| &node.entry)
    }

    /// Returns the entry for `key` mutably without changing its position.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Entry<V>> {
        let idx = *self.index.get(key)?;
        self.slots[idx].as_mut().map(|node| &mut node.entry)
    }

    /// Checks if a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    // == Touch ==
    /// Moves `key` to the front. Returns false if the key is absent.
    pub fn touch(&mut self, key: &str) -> bool {
        let Some(&idx) = self.index.get(key) else {
            return false;
        };
        if self.head != Some(idx) {
            self.unlink(idx);
            self.link_front(idx);
        }
        true
    }

    // == Push Front ==
    /// Inserts a new entry as the most recently used.
    ///
    /// If the key is already present its old entry is replaced and returned.
    pub fn push_front(&mut self, entry: Entry<V>) -> Option<Entry<V>> {
        let replaced = self.remove(&entry.key);
        let key = entry.key.clone();
        let node = Node {
            entry,
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.link_front(idx);
        self.index.insert(key, idx);
        replaced
    }

    // == Pop Back ==
    /// Removes and returns the least recently used entry.
    ///
    /// Returns None if the list is empty.
    pub fn pop_back(&mut self) -> Option<Entry<V>> {
        let idx = self.tail?;
        self.take(idx)
    }

    // == Peek Back ==
    /// Returns the least recently used entry without removing it.
    pub fn peek_back(&self) -> Option<&Entry<V>> {
        self.tail.and_then(|idx| self.node(idx)).map(|node| &node.entry)
    }

    // == Remove ==
    /// Removes the entry for `key`, wherever it sits in the order.
    pub fn remove(&mut self, key: &str) -> Option<Entry<V>> {
        let idx = *self.index.get(key)?;
        self.take(idx)
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    // == Length ==
    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // == Iteration ==
    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = &Entry<V>> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let node = self.node(cursor?)?;
            cursor = node.next;
            Some(&node.entry)
        })
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        self.iter().map(|entry| entry.key.clone()).collect()
    }

    // == Linking ==
    fn node(&self, idx: usize) -> Option<&Node<V>> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    fn take(&mut self, idx: usize) -> Option<Entry<V>> {
        self.unlink(idx);
        let node = self.slots[idx].take()?;
        self.index.remove(&node.entry.key);
        self.free.push(idx);
        Some(node.entry)
    }

    fn unlink(&mut self, idx: usize) {
        let Some(node) = self.slots[idx].as_mut() else {
            return;
        };
        let (prev, next) = (node.prev.take(), node.next.take());

        match prev {
            Some(p) => {
                if let Some(prev_node) = self.slots[p].as_mut() {
                    prev_node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(next_node) = self.slots[n].as_mut() {
                    next_node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn link_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => {
                if let Some(head_node) = self.slots[h].as_mut() {
                    head_node.prev = Some(idx);
                }
            }
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }
}
