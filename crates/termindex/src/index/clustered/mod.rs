//! Clustered discrimination tree.
//!
//! Maps (term, cluster) keys to chains of objects and retrieves every object
//! whose key term unifies with a query term under the query's cluster.
//!
//! Nonvariable key terms are spread over a fixed number of buckets by the
//! hash of their top symbol; within a bucket they share a tree of symbol
//! nodes spelling their prefix-order symbol sequences. Key terms that are a
//! bare variable unify with anything and live in a separate variable index.
//!
//! Every node carries the cluster bit tests that discriminate its subtree
//! from its siblings' (see [`node::ClusterTest`]). Mutations re-derive these
//! tests along the touched path so each check sits at the highest node where
//! it holds for every leaf below, and is never repeated further down.

mod maintenance;
pub(crate) mod node;
mod retrieval;

#[cfg(test)]
mod proptest_tests;

pub use retrieval::Retrieval;

use crate::config::IndexConfig;
use crate::index::cluster::Cluster;
use crate::logic::core::term::Variable;
use crate::logic::flatterm::{FlatSymbol, Subterm};
use indexmap::IndexMap;
use node::{ClusterSummary, NodeArena, NodeId, Siblings};
use std::cell::Cell;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub(crate) struct Bucket {
    pub roots: Siblings,
    pub summary: ClusterSummary,
}

#[derive(Debug)]
pub struct ClusteredIndex<T> {
    buckets: Vec<Bucket>,
    nodes: NodeArena<T>,
    variables: HashMap<Cluster, IndexMap<Variable, Vec<T>>>,
    entries: usize,
    // open retrieval cursors
    locks: Cell<usize>,
}

impl<T> Default for ClusteredIndex<T> {
    fn default() -> Self {
        ClusteredIndex::new(&IndexConfig::default())
    }
}

impl<T> ClusteredIndex<T> {
    pub fn new(config: &IndexConfig) -> Self {
        assert!(config.hash_table_size > 0, "index needs at least one bucket");
        ClusteredIndex {
            buckets: vec![Bucket::default(); config.hash_table_size],
            nodes: NodeArena::default(),
            variables: HashMap::new(),
            entries: 0,
            locks: Cell::new(0),
        }
    }

    /// Total number of stored objects
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Number of retrieval cursors currently holding the index
    pub fn open_retrievals(&self) -> usize {
        self.locks.get()
    }

    /// Open a retrieval cursor over this index
    pub fn retrieval(&self) -> Retrieval<'_, T> {
        Retrieval::new(self)
    }

    /// Number of objects stored under exactly this term and cluster
    pub fn count(&self, term: &Subterm, cluster: &Cluster) -> usize {
        if let Some(var) = term.as_variable() {
            return self
                .variables
                .get(cluster)
                .and_then(|by_var| by_var.get(&var))
                .map_or(0, Vec::len);
        }
        match self.locate(term) {
            Ok((_, path)) => path
                .last()
                .and_then(|&id| self.nodes.get(id).leaves.get(cluster))
                .map_or(0, Vec::len),
            Err(_) => 0,
        }
    }

    fn bucket_of(&self, symbol: FlatSymbol) -> usize {
        match symbol {
            FlatSymbol::Symbol(s) => s.id.as_u32() as usize % self.buckets.len(),
            _ => panic!("only nonvariable terms are bucketed"),
        }
    }

    fn siblings(&self, bucket: usize, parent: Option<NodeId>) -> &Siblings {
        match parent {
            None => &self.buckets[bucket].roots,
            Some(id) => &self.nodes.get(id).children,
        }
    }

    fn siblings_mut(&mut self, bucket: usize, parent: Option<NodeId>) -> &mut Siblings {
        match parent {
            None => &mut self.buckets[bucket].roots,
            Some(id) => &mut self.nodes.get_mut(id).children,
        }
    }

    /// Position of `symbol` among the sorted siblings, or where it would go
    fn find_child(
        &self,
        bucket: usize,
        parent: Option<NodeId>,
        symbol: FlatSymbol,
    ) -> Result<usize, usize> {
        self.siblings(bucket, parent)
            .binary_search_by(|&id| node::symbol_order(self.nodes.get(id).symbol, symbol))
    }

    fn unlocked(&self) -> bool {
        self.locks.get() == 0
    }

    fn lock(&self) {
        self.locks.set(self.locks.get() + 1);
    }

    fn unlock(&self) {
        debug_assert!(self.locks.get() > 0);
        self.locks.set(self.locks.get().saturating_sub(1));
    }
}
