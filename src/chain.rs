//! Chain: the collision list of a single bucket.
//!
//! Nodes are not heap-linked individually; every node of a table lives in
//! one generational arena (`SlotMap`) owned by the table, and a `Chain` only
//! stores the arena key of its head. Links are arena keys as well, so
//! relinking a node between chains never moves or clones its key.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Arena key of a chain node.
    pub(crate) struct NodeKey;
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) key: String,
    pub(crate) value: i32,
    next: Option<NodeKey>,
}

/// Storage for every node of one table.
pub(crate) type Arena = SlotMap<NodeKey, Node>;

#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct Chain {
    head: Option<NodeKey>,
}

impl Chain {
    pub(crate) const fn new() -> Self {
        Self { head: None }
    }

    pub(crate) fn head(&self) -> Option<NodeKey> {
        self.head
    }

    /// Successor of `node` in whatever chain currently holds it.
    #[inline]
    pub(crate) fn next(arena: &Arena, node: NodeKey) -> Option<NodeKey> {
        arena[node].next
    }

    pub(crate) fn iter<'a>(&self, arena: &'a Arena) -> ChainIter<'a> {
        ChainIter {
            arena,
            cursor: self.head,
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self, arena: &Arena) -> usize {
        self.iter(arena).count()
    }

    pub(crate) fn find(&self, arena: &Arena, key: &str) -> Option<NodeKey> {
        let mut cursor = self.head;
        while let Some(k) = cursor {
            let node = &arena[k];
            if node.key == key {
                return Some(k);
            }
            cursor = node.next;
        }
        None
    }

    /// Allocate a node and make it the new head.
    pub(crate) fn push_front(&mut self, arena: &mut Arena, key: String, value: i32) -> NodeKey {
        let k = arena.insert(Node {
            key,
            value,
            next: self.head,
        });
        self.head = Some(k);
        k
    }

    /// Allocate a node and append it after the current tail.
    pub(crate) fn push_back(&mut self, arena: &mut Arena, key: String, value: i32) -> NodeKey {
        let k = arena.insert(Node {
            key,
            value,
            next: None,
        });
        match self.head {
            None => self.head = Some(k),
            Some(mut tail) => {
                while let Some(next) = arena[tail].next {
                    tail = next;
                }
                arena[tail].next = Some(k);
            }
        }
        k
    }

    /// Make an already allocated node the new head. The node must not be
    /// reachable from any other chain afterwards.
    pub(crate) fn link_front(&mut self, arena: &mut Arena, node: NodeKey) {
        arena[node].next = self.head;
        self.head = Some(node);
    }

    /// Unlink the node holding `key` and free it from the arena.
    pub(crate) fn unlink(&mut self, arena: &mut Arena, key: &str) -> Option<Node> {
        let mut prev: Option<NodeKey> = None;
        let mut cursor = self.head;
        while let Some(k) = cursor {
            let node = &arena[k];
            if node.key == key {
                let next = node.next;
                match prev {
                    None => self.head = next,
                    Some(p) => arena[p].next = next,
                }
                return arena.remove(k);
            }
            prev = Some(k);
            cursor = node.next;
        }
        None
    }
}

/// Iterator over the nodes of one chain, head first.
pub(crate) struct ChainIter<'a> {
    arena: &'a Arena,
    cursor: Option<NodeKey>,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = &'a Node;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        let node = &arena[self.cursor?];
        self.cursor = node.next;
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(chain: &Chain, arena: &Arena) -> Vec<String> {
        chain.iter(arena).map(|n| n.key.clone()).collect()
    }

    /// Invariant: `push_front` prepends and `push_back` appends.
    #[test]
    fn push_front_and_back_order() {
        let mut arena = Arena::with_key();
        let mut c = Chain::new();
        assert!(c.head().is_none());
        c.push_front(&mut arena, "b".to_string(), 2);
        c.push_front(&mut arena, "a".to_string(), 1);
        c.push_back(&mut arena, "c".to_string(), 3);
        assert_eq!(keys(&c, &arena), ["a", "b", "c"]);
        assert_eq!(c.len(&arena), 3);
        assert_eq!(arena.len(), 3);
    }

    /// Invariant: unlinking head, middle and tail keeps the remaining order and
    /// frees exactly the removed node.
    #[test]
    fn unlink_head_middle_tail() {
        let mut arena = Arena::with_key();
        let mut c = Chain::new();
        for (i, k) in ["a", "b", "c", "d"].iter().enumerate() {
            c.push_back(&mut arena, (*k).to_string(), i as i32);
        }

        let n = c.unlink(&mut arena, "b").expect("middle");
        assert_eq!((n.key.as_str(), n.value), ("b", 1));
        assert_eq!(keys(&c, &arena), ["a", "c", "d"]);

        assert_eq!(c.unlink(&mut arena, "a").map(|n| n.value), Some(0));
        assert_eq!(keys(&c, &arena), ["c", "d"]);

        assert_eq!(c.unlink(&mut arena, "d").map(|n| n.value), Some(3));
        assert_eq!(keys(&c, &arena), ["c"]);
        assert_eq!(arena.len(), 1);

        assert!(c.unlink(&mut arena, "missing").is_none());
        assert_eq!(arena.len(), 1);
    }

    /// Invariant: `find` resolves the exact key among colliding nodes.
    #[test]
    fn find_exact_key() {
        let mut arena = Arena::with_key();
        let mut c = Chain::new();
        let ka = c.push_front(&mut arena, "a".to_string(), 1);
        let kab = c.push_front(&mut arena, "ab".to_string(), 2);
        assert_eq!(c.find(&arena, "a"), Some(ka));
        assert_eq!(c.find(&arena, "ab"), Some(kab));
        assert_eq!(c.find(&arena, "abc"), None);
        assert_eq!(c.find(&arena, ""), None);
    }

    /// Invariant: relinking moves the node between chains without reallocating it.
    #[test]
    fn link_front_moves_existing_node() {
        let mut arena = Arena::with_key();
        let mut from = Chain::new();
        let mut to = Chain::new();
        let k = from.push_front(&mut arena, "x".to_string(), 7);
        to.push_front(&mut arena, "y".to_string(), 8);

        let head = from.head().expect("non-empty");
        assert_eq!(Chain::next(&arena, head), None);
        from = Chain::new();
        to.link_front(&mut arena, head);

        assert!(from.head().is_none());
        assert_eq!(keys(&to, &arena), ["x", "y"]);
        assert_eq!(to.find(&arena, "x"), Some(k));
        assert_eq!(arena.len(), 2);
    }
}
