//! Traversal nodes and the arena pool that recycles them.
//!
//! Each datum being resolved gets a [`Node`] recording its parent, where its
//! value goes once built, which descriptor is building it, and the value
//! under construction. Nodes live in an arena addressed by [`NodeId`];
//! released nodes are reset and reused by later leases.

use std::sync::Arc;

use datagraft_foundation::Value;

use crate::descriptor::DescriptorRef;

/// Index of a node in a [`NodePool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Where a node's finished value is written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Slot {
    /// The document root; produces no value.
    Root,
    /// A named top-level entry of the environment.
    Entry(Arc<str>),
    /// A field (by target key) of the parent's object.
    Field(Arc<str>),
    /// An element of the parent's list.
    Index(usize),
}

/// Per-datum traversal state.
#[derive(Debug, Default)]
pub struct Node {
    parent: Option<NodeId>,
    slot: Option<Slot>,
    descriptor: Option<DescriptorRef>,
    value: Option<Value>,
    preserve: bool,
    in_use: bool,
}

impl Node {
    /// The node this one was created for.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Where the finished value goes.
    #[must_use]
    pub fn slot(&self) -> Option<&Slot> {
        self.slot.as_ref()
    }

    /// The descriptor building this node.
    #[must_use]
    pub fn descriptor(&self) -> Option<&DescriptorRef> {
        self.descriptor.as_ref()
    }

    /// The value under construction.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Mutable access to the value under construction.
    pub fn value_mut(&mut self) -> Option<&mut Value> {
        self.value.as_mut()
    }

    /// Replaces the value under construction.
    pub fn set_value(&mut self, value: Value) {
        self.value = Some(value);
    }

    /// True once a value has been created or inherited.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.value.is_some()
    }

    /// True if the node is kept out of the pool after release.
    #[must_use]
    pub fn is_preserved(&self) -> bool {
        self.preserve
    }

    /// True while leased.
    #[must_use]
    pub fn is_in_use(&self) -> bool {
        self.in_use
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Arena of traversal nodes with a free list.
#[derive(Debug, Default)]
pub struct NodePool {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
}

impl NodePool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out a fresh node, reusing a released one when available.
    pub fn lease(&mut self, parent: Option<NodeId>, slot: Slot, descriptor: DescriptorRef) -> NodeId {
        let id = self.free.pop().unwrap_or_else(|| {
            let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
            self.nodes.push(Node::default());
            id
        });
        let node = &mut self.nodes[id.index()];
        node.parent = parent;
        node.slot = Some(slot);
        node.descriptor = Some(descriptor);
        node.in_use = true;
        id
    }

    /// Returns a node to the pool.
    ///
    /// Preserved nodes keep their state and are never handed out again.
    /// Releasing a node that is not leased does nothing.
    pub fn release(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id.index()) else {
            return;
        };
        if !node.in_use {
            return;
        }
        node.in_use = false;
        if node.preserve {
            return;
        }
        node.reset();
        self.free.push(id);
    }

    /// Marks a node and all of its ancestors as preserved.
    pub fn preserve(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(id) = current {
            let Some(node) = self.nodes.get_mut(id.index()) else {
                break;
            };
            if node.preserve {
                break;
            }
            node.preserve = true;
            current = node.parent;
        }
    }

    /// Gets a node.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Gets a node mutably.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Drops trailing idle nodes until at most `retain` remain allocated.
    ///
    /// Nodes in use or preserved stop the trim, since their ids must stay
    /// valid.
    pub fn trim(&mut self, retain: usize) {
        while self.nodes.len() > retain {
            match self.nodes.last() {
                Some(last) if !last.in_use && !last.preserve => {
                    self.nodes.pop();
                }
                _ => break,
            }
        }
        let len = self.nodes.len();
        self.free.retain(|id| id.index() < len);
    }

    /// Number of allocated nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no node is allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes waiting for reuse.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Number of leased nodes.
    #[must_use]
    pub fn in_use_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.in_use).count()
    }

    /// Number of preserved nodes.
    #[must_use]
    pub fn preserved_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.preserve).count()
    }

    /// Iterates preserved nodes.
    pub fn preserved(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.preserve)
            .map(|(i, n)| (NodeId(u32::try_from(i).unwrap_or(u32::MAX)), n))
    }
}
