/*!
 * Skip-list backed sorted set.
 *
 * Members are ordered by `(score asc, member asc)`. Every level-i forward
 * link carries a span (the number of level-0 hops it covers), which is what
 * makes rank queries O(log n). A member->node index rides alongside the list
 * for O(1) existence checks.
 */

use hashbrown::HashMap;
use rand::Rng;
use slab::Slab;

pub const SKIPLIST_MAXLEVEL: usize = 32;
/// p = 0.25, expressed against a 16-bit draw.
const SKIPLIST_P: u32 = 0xFFFF / 4;

struct Level {
    forward: Option<usize>,
    span: u64,
}

struct Node {
    member: Vec<u8>,
    score: i64,
    levels: Vec<Level>,
    backward: Option<usize>,
}

/// Sorted set over `(score, member)` with rank support.
///
/// Nodes live in a slab arena; slab keys stand in for the pointers a
/// classical skip list would chase.
pub struct SortedSet {
    nodes: Slab<Node>,
    header: usize,
    tail: Option<usize>,
    length: u64,
    level: usize,
    index: HashMap<Vec<u8>, usize>,
}

impl Default for SortedSet {
    fn default() -> Self {
        Self::new()
    }
}

impl SortedSet {
    pub fn new() -> Self {
        let mut nodes = Slab::new();
        let header = nodes.insert(Node {
            member: Vec::new(),
            score: 0,
            levels: (0..SKIPLIST_MAXLEVEL)
                .map(|_| Level {
                    forward: None,
                    span: 0,
                })
                .collect(),
            backward: None,
        });
        Self {
            nodes,
            header,
            tail: None,
            length: 0,
            level: 1,
            index: HashMap::new(),
        }
    }

    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn contains(&self, member: &[u8]) -> bool {
        self.index.contains_key(member)
    }

    /// Insert `member` at `score`, or move an existing member to a new score.
    /// Returns true when the member was not present before.
    pub fn add_or_update(&mut self, member: &[u8], score: i64) -> bool {
        if let Some(&node) = self.index.get(member) {
            // Same score is a no-op; a changed score re-inserts at the new
            // position so spans stay exact.
            if self.nodes[node].score != score {
                let old = self.nodes[node].score;
                self.delete(old, member);
                self.insert_node(score, member.to_vec());
            }
            false
        } else {
            self.insert_node(score, member.to_vec());
            true
        }
    }

    /// Remove a member; returns true if it was present.
    pub fn remove(&mut self, member: &[u8]) -> bool {
        if let Some(&node) = self.index.get(member) {
            let score = self.nodes[node].score;
            self.delete(score, member)
        } else {
            false
        }
    }

    /// Members whose 1-based ranks fall in `[start, end]`.
    ///
    /// Negative indexes count from the tail (-1 = last). If start > end after
    /// normalization the slice is returned back-to-front.
    pub fn range_by_rank(&self, start: i64, end: i64) -> Vec<Vec<u8>> {
        let (start, end, reverse) = self.sanitize_indexes(start, end);
        if self.length == 0 {
            return Vec::new();
        }
        let (mut traversed, node) = self.find_node_by_rank(start);
        traversed += 1;
        let mut out = Vec::new();
        let mut cursor = self.nodes[node].levels[0].forward;
        while let Some(key) = cursor {
            if traversed > end {
                break;
            }
            out.push(self.nodes[key].member.clone());
            traversed += 1;
            cursor = self.nodes[key].levels[0].forward;
        }
        if reverse {
            out.reverse();
        }
        out
    }

    /// 1-based rank from the head (smallest score first).
    pub fn rank_from_head(&self, member: &[u8]) -> Option<u64> {
        let &node = self.index.get(member)?;
        Some(self.rank_of(node) + 1)
    }

    /// 1-based rank from the tail (largest score first).
    pub fn rank_from_tail(&self, member: &[u8]) -> Option<u64> {
        let &node = self.index.get(member)?;
        Some(self.length - self.rank_of(node))
    }

    /// Level-0 steps from the header to the node just before `node`.
    fn rank_of(&self, node: usize) -> u64 {
        let score = self.nodes[node].score;
        let member = &self.nodes[node].member;
        let mut rank = 0u64;
        let mut x = self.header;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].levels[i].forward {
                let n = &self.nodes[next];
                if n.score < score || (n.score == score && n.member < *member) {
                    rank += self.nodes[x].levels[i].span;
                    x = next;
                } else {
                    break;
                }
            }
        }
        rank
    }

    fn insert_node(&mut self, score: i64, member: Vec<u8>) {
        let mut update = [self.header; SKIPLIST_MAXLEVEL];
        let mut rank = [0u64; SKIPLIST_MAXLEVEL];
        let mut x = self.header;
        for i in (0..self.level).rev() {
            rank[i] = if i == self.level - 1 { 0 } else { rank[i + 1] };
            while let Some(next) = self.nodes[x].levels[i].forward {
                let n = &self.nodes[next];
                if n.score < score || (n.score == score && n.member < member) {
                    rank[i] += self.nodes[x].levels[i].span;
                    x = next;
                } else {
                    break;
                }
            }
            update[i] = x;
        }

        let level = random_level();
        if level > self.level {
            for i in self.level..level {
                rank[i] = 0;
                update[i] = self.header;
                self.nodes[self.header].levels[i].span = self.length;
            }
            self.level = level;
        }

        let node = self.nodes.insert(Node {
            member: member.clone(),
            score,
            levels: (0..level)
                .map(|_| Level {
                    forward: None,
                    span: 0,
                })
                .collect(),
            backward: None,
        });

        for i in 0..level {
            let prev = update[i];
            let prev_forward = self.nodes[prev].levels[i].forward;
            let prev_span = self.nodes[prev].levels[i].span;
            self.nodes[node].levels[i].forward = prev_forward;
            self.nodes[node].levels[i].span = prev_span - (rank[0] - rank[i]);
            self.nodes[prev].levels[i].forward = Some(node);
            self.nodes[prev].levels[i].span = (rank[0] - rank[i]) + 1;
        }
        // Untouched higher levels now cover one more level-0 hop.
        for i in level..self.level {
            self.nodes[update[i]].levels[i].span += 1;
        }

        self.nodes[node].backward = if update[0] == self.header {
            None
        } else {
            Some(update[0])
        };
        if let Some(forward) = self.nodes[node].levels[0].forward {
            self.nodes[forward].backward = Some(node);
        } else {
            self.tail = Some(node);
        }
        self.length += 1;
        self.index.insert(member, node);
    }

    fn delete(&mut self, score: i64, member: &[u8]) -> bool {
        let mut update = [self.header; SKIPLIST_MAXLEVEL];
        let mut x = self.header;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].levels[i].forward {
                let n = &self.nodes[next];
                if n.score < score || (n.score == score && n.member.as_slice() < member) {
                    x = next;
                } else {
                    break;
                }
            }
            update[i] = x;
        }
        let target = self.nodes[x].levels[0].forward;
        match target {
            Some(target)
                if self.nodes[target].score == score && self.nodes[target].member == member =>
            {
                self.delete_node(target, &update);
                true
            }
            _ => false,
        }
    }

    fn delete_node(&mut self, node: usize, update: &[usize; SKIPLIST_MAXLEVEL]) {
        for i in 0..self.level {
            if self.nodes[update[i]].levels[i].forward == Some(node) {
                let span = self.nodes[node].levels[i].span;
                let forward = self.nodes[node].levels[i].forward;
                let prev = &mut self.nodes[update[i]].levels[i];
                // The node's own span may be 0 (tail), so add before the -1.
                prev.span = prev.span + span - 1;
                prev.forward = forward;
            } else {
                self.nodes[update[i]].levels[i].span -= 1;
            }
        }
        if let Some(forward) = self.nodes[node].levels[0].forward {
            self.nodes[forward].backward = self.nodes[node].backward;
        } else {
            self.tail = self.nodes[node].backward;
        }
        while self.level > 1 && self.nodes[self.header].levels[self.level - 1].forward.is_none() {
            self.level -= 1;
        }
        self.length -= 1;
        let removed = self.nodes.remove(node);
        self.index.remove(&removed.member);
    }

    fn sanitize_indexes(&self, mut start: i64, mut end: i64) -> (u64, u64, bool) {
        let len = self.length as i64;
        if start < 0 {
            start = len + start + 1;
        }
        if end < 0 {
            end = len + end + 1;
        }
        if start <= 0 {
            start = 1;
        }
        if end <= 0 {
            end = 1;
        }
        let reverse = start > end;
        if reverse {
            std::mem::swap(&mut start, &mut end);
        }
        (start as u64, end as u64, reverse)
    }

    /// Descend to the node holding 1-based rank `start - 1` (the header when
    /// start is 1), returning the level-0 distance covered.
    fn find_node_by_rank(&self, start: u64) -> (u64, usize) {
        let mut traversed = 0u64;
        let mut x = self.header;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].levels[i].forward {
                if traversed + self.nodes[x].levels[i].span < start {
                    traversed += self.nodes[x].levels[i].span;
                    x = next;
                } else {
                    break;
                }
            }
            if traversed + 1 == start {
                break;
            }
        }
        (traversed, x)
    }
}

/// Geometric level draw: P(level > k) = 0.25^k, capped at MAXLEVEL.
fn random_level() -> usize {
    let mut rng = rand::thread_rng();
    let mut level = 1;
    while rng.gen::<u32>() & 0xFFFF < SKIPLIST_P {
        level += 1;
    }
    level.min(SKIPLIST_MAXLEVEL)
}
