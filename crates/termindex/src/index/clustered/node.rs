//! Tree nodes of the clustered discrimination tree
//!
//! Every node carries a [`ClusterTest`] taken relative to its parent's
//! cluster summary: the bits every cluster below the node has set and the
//! bits none of them has. A retrieval entering the node checks both at once.
//! This is the same filter as a chain of separate set-bit and clear-bit test
//! nodes between parent and child, folded into the child so siblings stay
//! sorted by symbol alone.

use crate::index::cluster::Cluster;
use crate::logic::core::term::Variable;
use crate::logic::flatterm::FlatSymbol;
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::cmp::Ordering;

/// Handle of a node in the index arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Children sorted by [`symbol_order`]
pub(crate) type Siblings = SmallVec<[NodeId; 4]>;

/// Intersection and union of all leaf clusters below a node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ClusterSummary {
    pub all: Cluster,
    pub any: Cluster,
}

impl ClusterSummary {
    pub fn of<'c>(clusters: impl IntoIterator<Item = &'c Cluster>) -> Self {
        let mut clusters = clusters.into_iter();
        let Some(first) = clusters.next() else {
            return ClusterSummary::default();
        };
        let mut summary = ClusterSummary {
            all: first.clone(),
            any: first.clone(),
        };
        for cluster in clusters {
            summary.all = summary.all.intersection(cluster);
            summary.any = summary.any.union(cluster);
        }
        summary
    }

    pub fn merge(summaries: &[&ClusterSummary]) -> Self {
        let mut iter = summaries.iter();
        let Some(first) = iter.next() else {
            return ClusterSummary::default();
        };
        let mut summary = (*first).clone();
        for other in iter {
            summary.all = summary.all.intersection(&other.all);
            summary.any = summary.any.union(&other.any);
        }
        summary
    }

    /// Could a leaf below carry exactly `cluster`?
    pub fn admits(&self, cluster: &Cluster) -> bool {
        cluster.contains_all(&self.all) && self.any.contains_all(cluster)
    }
}

/// Bit checks a query cluster must pass to enter a node.
///
/// Only the checks not already made by the parent are stored: `set` holds the
/// bits every leaf below has but some leaf below the parent lacks, `clear` the
/// bits no leaf below has but some leaf below the parent has.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ClusterTest {
    pub set: Cluster,
    pub clear: Cluster,
}

impl ClusterTest {
    pub fn between(parent: &ClusterSummary, child: &ClusterSummary) -> Self {
        ClusterTest {
            set: child.all.difference(&parent.all),
            clear: parent.any.difference(&child.any),
        }
    }

    pub fn passes(&self, cluster: &Cluster) -> bool {
        cluster.contains_all(&self.set) && cluster.is_disjoint(&self.clear)
    }

    #[cfg(test)]
    pub fn is_trivial(&self) -> bool {
        self.set.is_empty() && self.clear.is_empty()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Node<T> {
    pub symbol: FlatSymbol,
    pub children: Siblings,
    /// Entries of the term spelled by the path to this node, per cluster.
    /// Only nodes that complete a term have leaves, and those have no children.
    pub leaves: IndexMap<Cluster, Vec<T>>,
    pub summary: ClusterSummary,
    pub test: ClusterTest,
}

impl<T> Node<T> {
    pub fn new(symbol: FlatSymbol) -> Self {
        Node {
            symbol,
            children: Siblings::new(),
            leaves: IndexMap::new(),
            summary: ClusterSummary::default(),
            test: ClusterTest::default(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_dead(&self) -> bool {
        self.children.is_empty() && self.leaves.is_empty()
    }
}

/// Arena with a free list
#[derive(Debug, Clone)]
pub(crate) struct NodeArena<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<NodeId>,
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        NodeArena {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T> NodeArena<T> {
    pub fn alloc(&mut self, node: Node<T>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.slots[id.index()] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                NodeId((self.slots.len() - 1) as u32)
            }
        }
    }

    pub fn release(&mut self, id: NodeId) -> Option<Node<T>> {
        let node = self.slots.get_mut(id.index())?.take();
        if node.is_some() {
            self.free.push(id);
        }
        node
    }

    pub fn get(&self, id: NodeId) -> &Node<T> {
        match self.slots.get(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("dangling index node {id:?}"),
        }
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node<T> {
        match self.slots.get_mut(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("dangling index node {id:?}"),
        }
    }

    /// Number of live nodes
    #[cfg(test)]
    pub fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}

/// Sibling order: variables first (by bank, then index), then symbols by
/// category, id and arity.
pub(crate) fn symbol_order(a: FlatSymbol, b: FlatSymbol) -> Ordering {
    fn key(symbol: FlatSymbol) -> (u8, Option<Variable>, u8, u32, u8) {
        match symbol {
            FlatSymbol::Variable(v) => (0, Some(v), 0, 0, 0),
            FlatSymbol::Symbol(s) => (1, None, s.kind as u8, s.id.as_u32(), s.arity),
            FlatSymbol::Abstraction(_) => panic!("binders are never indexed"),
        }
    }
    key(a).cmp(&key(b))
}
