use std::{
    cmp::Reverse,
    collections::{HashMap, VecDeque},
};

use priority_queue::PriorityQueue;

use super::LinkedNode;

pub(crate) struct Entry<N: LinkedNode> {
    pub node: N,
    pub g: usize,
    pub h: usize,
    pub path: Vec<N::Action>,
}

impl<N: LinkedNode> Entry<N> {
    #[inline]
    pub fn f(&self) -> usize {
        self.g.saturating_add(self.h)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Offer {
    Inserted,
    /// Already known with a higher `f`; the known entry was replaced.
    Improved,
    Duplicate,
}

pub(crate) trait Frontier<N: LinkedNode> {
    fn is_empty(&self) -> bool;
    fn pop(&mut self) -> Option<Entry<N>>;
    fn offer(&mut self, entry: Entry<N>) -> Offer;
    /// Called once all successors of an expansion have been offered.
    fn settle(&mut self) { }
}

/// Deque of entries kept sorted by `f` lazily: it is only re-sorted when an
/// entry offered since the last sort has an `f` no greater than the front's.
/// Sorting is stable, so equal `f` values pop in insertion order.
pub(crate) struct SortedFrontier<N: LinkedNode> {
    slots: Vec<Option<Entry<N>>>,
    free: Vec<usize>,
    order: VecDeque<usize>,
    index: HashMap<N, usize>,
    best_f_seen: usize,
}

impl<N: LinkedNode> SortedFrontier<N> {
    pub fn new() -> Self {
        Self { slots: Vec::new(), free: Vec::new(), order: VecDeque::new(), index: HashMap::new(), best_f_seen: usize::MAX }
    }

    fn f_of(&self, slot: usize) -> usize {
        self.slots.get(slot).and_then(Option::as_ref).map_or(usize::MAX, Entry::f)
    }
}

impl<N: LinkedNode> Frontier<N> for SortedFrontier<N> {
    fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn pop(&mut self) -> Option<Entry<N>> {
        let slot = self.order.pop_front()?;
        let entry = self.slots.get_mut(slot)?.take()?;
        self.free.push(slot);
        self.index.remove(&entry.node);
        Some(entry)
    }

    fn offer(&mut self, entry: Entry<N>) -> Offer {
        let f = entry.f();
        // duplicates count too, a sort may be due either way
        self.best_f_seen = self.best_f_seen.min(f);
        if let Some(&slot) = self.index.get(&entry.node) {
            if self.f_of(slot) <= f {
                return Offer::Duplicate;
            }
            self.slots[slot] = Some(entry);
            return Offer::Improved;
        }
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.slots.push(None);
                self.slots.len() - 1
            },
        };
        self.index.insert(entry.node.clone(), slot);
        self.slots[slot] = Some(entry);
        self.order.push_back(slot);
        Offer::Inserted
    }

    fn settle(&mut self) {
        let Some(&front) = self.order.front() else { return };
        if self.best_f_seen <= self.f_of(front) {
            let slots = &self.slots;
            self.order.make_contiguous().sort_by_key(|&slot| slots.get(slot).and_then(Option::as_ref).map_or(usize::MAX, Entry::f));
            self.best_f_seen = usize::MAX;
        }
    }
}

/// Binary heap keyed by `(f, insertion sequence)`, improvements re-key in
/// place.
pub(crate) struct HeapFrontier<N: LinkedNode> {
    queue: PriorityQueue<N, Reverse<(usize, u64)>>,
    entries: HashMap<N, Entry<N>>,
    sequence: u64,
}

impl<N: LinkedNode> HeapFrontier<N> {
    pub fn new() -> Self {
        Self { queue: PriorityQueue::new(), entries: HashMap::new(), sequence: 0 }
    }
}

impl<N: LinkedNode> Frontier<N> for HeapFrontier<N> {
    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn pop(&mut self) -> Option<Entry<N>> {
        let (node, _) = self.queue.pop()?;
        self.entries.remove(&node)
    }

    fn offer(&mut self, entry: Entry<N>) -> Offer {
        let f = entry.f();
        if let Some(known) = self.entries.get_mut(&entry.node) {
            if known.f() <= f {
                return Offer::Duplicate;
            }
            self.sequence += 1;
            self.queue.change_priority(&entry.node, Reverse((f, self.sequence)));
            *known = entry;
            return Offer::Improved;
        }
        self.sequence += 1;
        self.queue.push(entry.node.clone(), Reverse((f, self.sequence)));
        self.entries.insert(entry.node.clone(), entry);
        Offer::Inserted
    }
}
