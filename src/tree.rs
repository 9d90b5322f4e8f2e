//! Huffman code tree.
//!
//! Nodes live in a flat arena and refer to their children by index. The tree
//! is built greedily from a min-priority queue: the two lightest nodes are
//! merged until one remains.
//!
//! Ties are broken by insertion order. Leaves are seeded in ascending byte
//! order and every merged parent is appended after all existing nodes, so the
//! arena index doubles as the insertion sequence number. Two builds from the
//! same histogram therefore always produce the same tree, which is what lets
//! a decoder rebuild the encoder's codes from the stored frequencies alone.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::histogram::Histogram;

/// What a node holds besides its weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// A byte value.
    Leaf {
        /// The byte this leaf decodes to.
        byte: u8,
    },
    /// A merge of two subtrees, referenced by arena index.
    Internal {
        /// Subtree reached by a `0` bit.
        left: usize,
        /// Subtree reached by a `1` bit.
        right: usize,
    },
}

/// An arena node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Node {
    /// Leaf count, or the sum of both children's weights.
    pub weight: u64,
    /// Leaf or internal payload.
    pub kind: NodeKind,
}

/// Heap entry ordered so that `BinaryHeap` pops the lightest, oldest node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Pending {
    weight: u64,
    index: usize,
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-priority queue on (weight, insertion order).
        other
            .weight
            .cmp(&self.weight)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A strict binary tree whose leaves are byte values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeTree {
    nodes: Vec<Node>,
    root: Option<usize>,
}

impl CodeTree {
    /// Build the tree for `histogram`.
    ///
    /// An empty histogram yields an empty tree. A histogram with a single
    /// symbol gets a weight-0 sibling leaf so that the symbol still has a
    /// one-bit code.
    pub fn build(histogram: &Histogram) -> Self {
        let mut seeds: Vec<(u8, u64)> = histogram.nonzero().collect();
        if seeds.is_empty() {
            return Self::default();
        }
        if let [(only, _)] = seeds[..] {
            let filler = if only == 0 { 1 } else { 0 };
            seeds.push((filler, 0));
            seeds.sort_unstable_by_key(|&(byte, _)| byte);
        }

        let mut nodes = Vec::with_capacity(2 * seeds.len() - 1);
        let mut heap = BinaryHeap::with_capacity(seeds.len());
        for (byte, weight) in seeds {
            heap.push(Pending {
                weight,
                index: nodes.len(),
            });
            nodes.push(Node {
                weight,
                kind: NodeKind::Leaf { byte },
            });
        }

        while heap.len() > 1 {
            let (Some(left), Some(right)) = (heap.pop(), heap.pop()) else {
                break;
            };
            let weight = left.weight.saturating_add(right.weight);
            let index = nodes.len();
            nodes.push(Node {
                weight,
                kind: NodeKind::Internal {
                    left: left.index,
                    right: right.index,
                },
            });
            heap.push(Pending { weight, index });
        }

        let root = heap.pop().map(|p| p.index);
        log::debug!(
            "code tree: {} nodes, root weight {}",
            nodes.len(),
            root.map_or(0, |r| nodes[r].weight)
        );
        Self { nodes, root }
    }

    /// Arena index of the root, or `None` for an empty tree.
    pub fn root(&self) -> Option<usize> {
        self.root
    }

    /// The node at `index`.
    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Whether the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Depth of every leaf indexed by byte value; 0 for absent bytes.
    pub fn leaf_depths(&self) -> [u32; 256] {
        let mut depths = [0u32; 256];
        let Some(root) = self.root else {
            return depths;
        };
        let mut stack = vec![(root, 0u32)];
        while let Some((index, depth)) = stack.pop() {
            match self.nodes[index].kind {
                NodeKind::Leaf { byte } => depths[byte as usize] = depth,
                NodeKind::Internal { left, right } => {
                    stack.push((right, depth + 1));
                    stack.push((left, depth + 1));
                }
            }
        }
        depths
    }

    /// Number of leaves, including a synthetic sibling.
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Leaf { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hist(pairs: &[(u8, u64)]) -> Histogram {
        Histogram::from_pairs(pairs.iter().copied())
    }

    fn depth_of(tree: &CodeTree, byte: u8) -> Option<usize> {
        let mut stack = vec![(tree.root()?, 0usize)];
        while let Some((i, d)) = stack.pop() {
            match tree.node(i).kind {
                NodeKind::Leaf { byte: b } if b == byte => return Some(d),
                NodeKind::Leaf { .. } => {}
                NodeKind::Internal { left, right } => {
                    stack.push((left, d + 1));
                    stack.push((right, d + 1));
                }
            }
        }
        None
    }

    #[test]
    fn test_empty_histogram() {
        let tree = CodeTree::build(&Histogram::new());
        assert!(tree.is_empty());
        assert_eq!(tree.leaf_count(), 0);
    }

    #[test]
    fn test_single_symbol_gets_sibling() {
        let tree = CodeTree::build(&hist(&[(b'x', 10)]));
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(depth_of(&tree, b'x'), Some(1));
        assert_eq!(depth_of(&tree, 0), Some(1));

        let tree = CodeTree::build(&hist(&[(0, 3)]));
        assert_eq!(depth_of(&tree, 0), Some(1));
        assert_eq!(depth_of(&tree, 1), Some(1));
    }

    #[test]
    fn test_strict_binary_and_weights() {
        let tree = CodeTree::build(&hist(&[(b'a', 4), (b'b', 3), (b'c', 2), (b'd', 1)]));
        let root = tree.root().unwrap();
        assert_eq!(tree.node(root).weight, 10);
        for node in tree.nodes() {
            if let NodeKind::Internal { left, right } = node.kind {
                assert_eq!(node.weight, tree.node(left).weight + tree.node(right).weight);
            }
        }
        assert_eq!(depth_of(&tree, b'a'), Some(1));
        assert_eq!(depth_of(&tree, b'b'), Some(2));
        assert_eq!(depth_of(&tree, b'c'), Some(3));
        assert_eq!(depth_of(&tree, b'd'), Some(3));
    }

    #[test]
    fn test_ties_follow_insertion_order() {
        // All equal weights: the two lowest byte values merge first.
        let tree = CodeTree::build(&hist(&[(1, 5), (2, 5), (3, 5), (4, 5)]));
        let first_parent = tree.nodes()[4];
        assert_eq!(first_parent.kind, NodeKind::Internal { left: 0, right: 1 });
        let second_parent = tree.nodes()[5];
        assert_eq!(second_parent.kind, NodeKind::Internal { left: 2, right: 3 });
    }

    #[test]
    fn test_build_is_deterministic() {
        let h = hist(&[(9, 7), (3, 7), (200, 1), (17, 7), (42, 2), (43, 2)]);
        assert_eq!(CodeTree::build(&h), CodeTree::build(&h));
    }
}
