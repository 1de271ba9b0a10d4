use std::collections::VecDeque;
use std::iter::Iterator;

use super::{NodeIndex, TreeNode};

/// Level-order (BFT) iterator of nodes in a decision tree
pub struct NodeIter<'a, F, L> {
    nodes: &'a [TreeNode<F, L>],
    queue: VecDeque<NodeIndex>,
}

impl<'a, F, L> NodeIter<'a, F, L> {
    /// Iterates the arena `nodes`, starting at the root
    pub fn new(nodes: &'a [TreeNode<F, L>]) -> Self {
        let mut queue = VecDeque::new();
        if !nodes.is_empty() {
            queue.push_back(NodeIndex::root());
        }

        NodeIter { nodes, queue }
    }
}

impl<'a, F: Copy, L> Iterator for NodeIter<'a, F, L> {
    type Item = &'a TreeNode<F, L>;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.queue.pop_front()?;
        let node = &self.nodes[idx.index()];

        if let Some((left, right)) = node.children() {
            self.queue.push_back(left);
            self.queue.push_back(right);
        }

        Some(node)
    }
}
