use crate::id::{BlockPos, ChunkPos, NodeKey};
use crate::node::Node;
use slotmap::SlotMap;
use std::collections::HashMap;

/// In-memory cache of active nodes, keyed by coordinate.
///
/// Nodes live in a slot map; a coordinate index resolves positions to keys.
/// Readers get owned copies; writers replace whole records with
/// [`cache`](Self::cache). Iteration follows slot order, which is stable for
/// the lifetime of a record.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: SlotMap<NodeKey, Node>,
    by_pos: HashMap<BlockPos, NodeKey>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        self.by_pos.contains_key(&pos)
    }

    /// An owned copy of the node at `pos`.
    pub fn get(&self, pos: BlockPos) -> Option<Node> {
        self.peek(pos).cloned()
    }

    /// Borrow the node at `pos` without copying.
    pub fn peek(&self, pos: BlockPos) -> Option<&Node> {
        self.by_pos.get(&pos).and_then(|key| self.nodes.get(*key))
    }

    /// Insert a node, replacing any record at the same coordinate in place.
    pub fn cache(&mut self, node: Node) -> NodeKey {
        let pos = node.pos();
        if let Some(&key) = self.by_pos.get(&pos) {
            if let Some(slot) = self.nodes.get_mut(key) {
                *slot = node;
                return key;
            }
        }
        let key = self.nodes.insert(node);
        self.by_pos.insert(pos, key);
        key
    }

    pub fn remove(&mut self, pos: BlockPos) -> Option<Node> {
        let key = self.by_pos.remove(&pos)?;
        self.nodes.remove(key)
    }

    /// Coordinates of every cached node, in registry order.
    pub fn positions(&self) -> Vec<BlockPos> {
        self.nodes.values().map(Node::pos).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Evict every node inside `chunk`. Returns how many were evicted.
    pub fn evict_chunk(&mut self, chunk: ChunkPos) -> usize {
        let doomed: Vec<BlockPos> = self
            .nodes
            .values()
            .map(Node::pos)
            .filter(|pos| chunk.contains(*pos))
            .collect();
        for pos in &doomed {
            self.remove(*pos);
        }
        doomed.len()
    }

    /// Remove every link pointing at `destination`. Returns the coordinates
    /// of the nodes that changed.
    pub fn purge_links_to(&mut self, destination: BlockPos) -> Vec<BlockPos> {
        self.nodes
            .values_mut()
            .filter_map(|node| node.prune_links_to(destination).then(|| node.pos()))
            .collect()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.by_pos.clear();
    }
}
