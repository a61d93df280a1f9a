//! Doubly linked pending list over an index arena.
//!
//! Nodes live in a `Vec` and link to each other by slot index, so a node can
//! be unlinked in O(1) given only its slot. Freed slots are recycled LIFO.
//!
//! Invariants (checked by `check_integrity` in tests, and by debug asserts on
//! the unlink path):
//! - `head.prev` and `tail.next` are `None`.
//! - Every occupied slot is reachable from `head` exactly once.
//! - `len` equals the number of occupied slots.

#[derive(Debug)]
struct Node<T> {
    prev: Option<u32>,
    next: Option<u32>,
    value: Option<T>,
}

#[derive(Debug)]
pub struct PendingList<T> {
    nodes: Vec<Node<T>>,
    free: Vec<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
}

impl<T> PendingList<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn head(&self) -> Option<u32> {
        self.head
    }

    pub fn tail(&self) -> Option<u32> {
        self.tail
    }

    /// The slot the next `push_back` will occupy.
    pub fn next_slot(&self) -> u32 {
        self.free
            .last()
            .copied()
            .unwrap_or(self.nodes.len() as u32)
    }

    /// The value in an occupied slot.
    pub fn get(&self, slot: u32) -> Option<&T> {
        self.nodes.get(slot as usize)?.value.as_ref()
    }

    /// `(prev, next)` of an occupied slot.
    pub fn links(&self, slot: u32) -> Option<(Option<u32>, Option<u32>)> {
        self.nodes
            .get(slot as usize)
            .filter(|node| node.value.is_some())
            .map(|node| (node.prev, node.next))
    }

    /// Append at the tail and return the slot used.
    pub fn push_back(&mut self, value: T) -> u32 {
        let node = Node {
            prev: self.tail,
            next: None,
            value: Some(value),
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot as usize] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                (self.nodes.len() - 1) as u32
            }
        };

        match self.tail {
            Some(tail) => self.nodes[tail as usize].next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.len += 1;
        slot
    }

    pub fn pop_front(&mut self) -> Option<(u32, T)> {
        let slot = self.head?;
        Some((slot, self.unlink(slot)))
    }

    /// Remove an occupied slot, relinking its neighbours and fixing up
    /// head/tail when it sits at either end.
    ///
    /// # Panics
    /// If `slot` is not occupied. Callers only unlink slots named by a live
    /// marker, so this is a broken invariant rather than a runtime condition.
    pub fn unlink(&mut self, slot: u32) -> T {
        let (prev, next, value) = {
            let node = &mut self.nodes[slot as usize];
            let value = node
                .value
                .take()
                .expect("unlink of a slot that is not on the pending list");
            (node.prev.take(), node.next.take(), value)
        };

        debug_assert!(prev.is_some() || self.head == Some(slot));
        debug_assert!(next.is_some() || self.tail == Some(slot));

        match prev {
            Some(p) => self.nodes[p as usize].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n as usize].prev = prev,
            None => self.tail = prev,
        }

        self.free.push(slot);
        self.len -= 1;
        value
    }

    /// Values in FIFO order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    #[cfg(test)]
    pub(crate) fn check_integrity(&self) {
        let mut seen = 0;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            let node = &self.nodes[slot as usize];
            assert!(node.value.is_some(), "slot {slot} linked but empty");
            assert_eq!(node.prev, prev, "slot {slot} has a stale back link");
            seen += 1;
            assert!(seen <= self.len, "cycle in pending list");
            prev = Some(slot);
            cursor = node.next;
        }
        assert_eq!(self.tail, prev);
        assert_eq!(seen, self.len);
        let occupied = self.nodes.iter().filter(|n| n.value.is_some()).count();
        assert_eq!(occupied, self.len);
    }
}

impl<T> Default for PendingList<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Iter<'a, T> {
    list: &'a PendingList<T>,
    cursor: Option<u32>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        let list = self.list;
        let node = &list.nodes[slot as usize];
        self.cursor = node.next;
        node.value.as_ref()
    }
}
