/*!
 * Doubly-linked list over a slab arena.
 *
 * Slab keys replace node pointers, which keeps the structure in safe Rust
 * while preserving O(1) pushes and pops at both ends. Range extraction walks
 * forward from the head.
 */

use slab::Slab;

struct Node {
    value: Vec<u8>,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Default)]
pub struct DoublyList {
    nodes: Slab<Node>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl DoublyList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn push_front(&mut self, value: Vec<u8>) -> usize {
        let node = self.nodes.insert(Node {
            value,
            prev: None,
            next: self.head,
        });
        match self.head {
            Some(old) => self.nodes[old].prev = Some(node),
            None => self.tail = Some(node),
        }
        self.head = Some(node);
        self.len()
    }

    pub fn push_back(&mut self, value: Vec<u8>) -> usize {
        let node = self.nodes.insert(Node {
            value,
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(old) => self.nodes[old].next = Some(node),
            None => self.head = Some(node),
        }
        self.tail = Some(node);
        self.len()
    }

    pub fn pop_front(&mut self) -> Option<Vec<u8>> {
        let head = self.head?;
        let node = self.nodes.remove(head);
        self.head = node.next;
        match self.head {
            Some(new_head) => self.nodes[new_head].prev = None,
            None => self.tail = None,
        }
        Some(node.value)
    }

    pub fn pop_back(&mut self) -> Option<Vec<u8>> {
        let tail = self.tail?;
        let node = self.nodes.remove(tail);
        self.tail = node.prev;
        match self.tail {
            Some(new_tail) => self.nodes[new_tail].next = None,
            None => self.head = None,
        }
        Some(node.value)
    }

    /// Inclusive range by index; negatives count from the tail (-1 = last).
    /// Out-of-bound endpoints clamp, and an inverted range is empty.
    pub fn range(&self, start: i64, stop: i64) -> Vec<Vec<u8>> {
        let len = self.len() as i64;
        if len == 0 {
            return Vec::new();
        }
        let mut start = if start < 0 { len + start } else { start };
        let mut stop = if stop < 0 { len + stop } else { stop };
        if start < 0 {
            start = 0;
        }
        if stop >= len {
            stop = len - 1;
        }
        if start > stop {
            return Vec::new();
        }

        let mut out = Vec::with_capacity((stop - start + 1) as usize);
        let mut cursor = self.head;
        let mut idx = 0i64;
        while let Some(key) = cursor {
            if idx > stop {
                break;
            }
            if idx >= start {
                out.push(self.nodes[key].value.clone());
            }
            idx += 1;
            cursor = self.nodes[key].next;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Vec<u8> {
        s.as_bytes().to_vec()
    }

    #[test]
    fn push_pop_both_ends() {
        let mut list = DoublyList::new();
        assert_eq!(list.push_front(v("b")), 1);
        assert_eq!(list.push_front(v("a")), 2);
        assert_eq!(list.push_back(v("c")), 3);
        assert_eq!(list.pop_front(), Some(v("a")));
        assert_eq!(list.pop_back(), Some(v("c")));
        assert_eq!(list.pop_back(), Some(v("b")));
        assert_eq!(list.pop_back(), None);
        assert_eq!(list.pop_front(), None);
        assert!(list.is_empty());
    }

    #[test]
    fn range_with_negative_indexes() {
        let mut list = DoublyList::new();
        for s in ["a", "b", "c", "d"] {
            list.push_back(v(s));
        }
        assert_eq!(list.range(0, -1), vec![v("a"), v("b"), v("c"), v("d")]);
        assert_eq!(list.range(1, 2), vec![v("b"), v("c")]);
        assert_eq!(list.range(-2, -1), vec![v("c"), v("d")]);
        assert_eq!(list.range(2, 100), vec![v("c"), v("d")]);
        assert_eq!(list.range(3, 1), Vec::<Vec<u8>>::new());
        assert_eq!(list.range(-100, 0), vec![v("a")]);
    }

    #[test]
    fn interleaved_reuse_of_slots() {
        let mut list = DoublyList::new();
        for i in 0..10 {
            list.push_back(format!("{i}").into_bytes());
        }
        for _ in 0..5 {
            list.pop_front();
        }
        list.push_front(v("x"));
        assert_eq!(list.len(), 6);
        assert_eq!(
            list.range(0, -1),
            vec![v("x"), v("5"), v("6"), v("7"), v("8"), v("9")]
        );
    }
}
