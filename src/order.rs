//! Entry store: a slot arena with an intrusive insertion-order list.
//!
//! Entries live in a `SlotMap`, so every entry has a stable generational key
//! and removing one entry never relocates or invalidates another. Order is
//! threaded through the nodes as `prev`/`next` slot keys: the list head is the
//! most recently inserted entry, the tail the oldest. Unlinking by key is O(1).

use slotmap::{DefaultKey, SlotMap};

pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    /// Hash cached at insertion; `K: Hash` is never invoked again for a
    /// stored entry.
    pub(crate) hash: u64,
    prev: Option<DefaultKey>,
    next: Option<DefaultKey>,
}

pub(crate) struct OrderedSlots<K, V> {
    slots: SlotMap<DefaultKey, Node<K, V>>,
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
}

impl<K, V> OrderedSlots<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: SlotMap::new(),
            head: None,
            tail: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn get(&self, k: DefaultKey) -> Option<&Node<K, V>> {
        self.slots.get(k)
    }

    pub(crate) fn get_mut(&mut self, k: DefaultKey) -> Option<&mut Node<K, V>> {
        self.slots.get_mut(k)
    }

    /// Prepend a new entry and return its stable key.
    pub(crate) fn push_front(&mut self, key: K, value: V, hash: u64) -> DefaultKey {
        let old_head = self.head;
        let k = self.slots.insert(Node {
            key,
            value,
            hash,
            prev: None,
            next: old_head,
        });
        match old_head {
            Some(h) => self.slots[h].prev = Some(k),
            None => self.tail = Some(k),
        }
        self.head = Some(k);
        k
    }

    /// Unlink and take the node for `k`. Neighbors are re-stitched; no other
    /// node moves, so all other keys stay valid.
    pub(crate) fn remove(&mut self, k: DefaultKey) -> Option<Node<K, V>> {
        let node = self.slots.remove(k)?;
        match node.prev {
            Some(p) => self.slots[p].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => self.slots[n].prev = node.prev,
            None => self.tail = node.prev,
        }
        Some(node)
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.head = None;
        self.tail = None;
    }

    /// Walk front (most recently inserted) to back.
    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            next: self.head,
        }
    }

    pub(crate) fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let next = self.head;
        IterMut {
            slots: &mut self.slots,
            next,
        }
    }

    /// Walk back (oldest) to front; used to rebuild a copy in the same order
    /// via repeated `push_front`.
    pub(crate) fn iter_from_back(&self) -> BackIter<'_, K, V> {
        BackIter {
            slots: &self.slots,
            next: self.tail,
        }
    }

    pub(crate) fn into_pairs(self) -> IntoPairs<K, V> {
        IntoPairs {
            next: self.head,
            slots: self.slots,
        }
    }
}

pub(crate) struct Iter<'a, K, V> {
    slots: &'a SlotMap<DefaultKey, Node<K, V>>,
    next: Option<DefaultKey>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (DefaultKey, &'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let k = self.next?;
        let node = self.slots.get(k)?;
        self.next = node.next;
        Some((k, &node.key, &node.value))
    }
}

pub(crate) struct IterMut<'a, K, V> {
    slots: &'a mut SlotMap<DefaultKey, Node<K, V>>,
    next: Option<DefaultKey>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (DefaultKey, &'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let k = self.next?;
        let node = self.slots.get_mut(k)?;
        self.next = node.next;
        // SAFETY: the chain visits each slot key at most once (keys are unique
        // along the list), so no two items returned by this iterator alias.
        // The borrow of `self.slots` outlives the iterator for 'a.
        let node = unsafe { &mut *(node as *mut Node<K, V>) };
        Some((k, &node.key, &mut node.value))
    }
}

pub(crate) struct BackIter<'a, K, V> {
    slots: &'a SlotMap<DefaultKey, Node<K, V>>,
    next: Option<DefaultKey>,
}

impl<'a, K, V> Iterator for BackIter<'a, K, V> {
    type Item = &'a Node<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let k = self.next?;
        let node = self.slots.get(k)?;
        self.next = node.prev;
        Some(node)
    }
}

pub(crate) struct IntoPairs<K, V> {
    slots: SlotMap<DefaultKey, Node<K, V>>,
    next: Option<DefaultKey>,
}

impl<K, V> Iterator for IntoPairs<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let k = self.next?;
        let node = self.slots.remove(k)?;
        self.next = node.next;
        Some((node.key, node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.slots.len();
        (n, Some(n))
    }
}

impl<K, V> ExactSizeIterator for IntoPairs<K, V> {}
