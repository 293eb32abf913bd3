//! Insertion, erasure and relocation of index entries

use super::node::{ClusterSummary, ClusterTest, Node, NodeId};
use super::ClusteredIndex;
use crate::error::IndexError;
use crate::index::cluster::Cluster;
use crate::logic::flatterm::Subterm;

impl<T> ClusteredIndex<T> {
    /// Add `object` under the key (`term`, `cluster`).
    ///
    /// Panics if a retrieval is open or if `term` contains a quantifier.
    pub fn insert(&mut self, term: &Subterm, cluster: Cluster, object: T) {
        assert!(self.unlocked(), "index mutated during retrieval");
        assert!(term.is_quantifier_free(), "quantified terms cannot be indexed");
        self.entries += 1;

        if let Some(var) = term.as_variable() {
            self.variables
                .entry(cluster)
                .or_default()
                .entry(var)
                .or_default()
                .push(object);
            return;
        }

        let bucket = self.bucket_of(term.symbol());
        let mut path = Vec::with_capacity(term.len());
        let mut parent = None;
        for symbol in term.symbols() {
            let id = match self.find_child(bucket, parent, symbol) {
                Ok(at) => self.siblings(bucket, parent)[at],
                Err(at) => {
                    let id = self.nodes.alloc(Node::new(symbol));
                    self.siblings_mut(bucket, parent).insert(at, id);
                    id
                }
            };
            path.push(id);
            parent = Some(id);
        }
        if let Some(&terminal) = path.last() {
            self.nodes
                .get_mut(terminal)
                .leaves
                .entry(cluster)
                .or_default()
                .push(object);
        }
        self.renormalize(bucket, &path);
    }

    /// Delete the objects stored under (`term`, `cluster`) for which
    /// `predicate` holds. Returns how many were deleted.
    pub fn erase<P>(&mut self, term: &Subterm, cluster: &Cluster, predicate: P) -> usize
    where
        P: FnMut(&T) -> bool,
    {
        match self.try_erase(term, cluster, predicate) {
            Ok(removed) => {
                tracing::debug!(?cluster, removed, "erased index entries");
                removed
            }
            Err(err) => {
                tracing::trace!(%err, ?cluster, "nothing to erase");
                0
            }
        }
    }

    /// Move the objects stored under (`term`, `cluster`) for which
    /// `predicate` holds to (`term`, `target`). Returns how many moved.
    pub fn relocate<P>(
        &mut self,
        term: &Subterm,
        cluster: &Cluster,
        target: Cluster,
        predicate: P,
    ) -> usize
    where
        P: FnMut(&T) -> bool,
    {
        match self.try_relocate(term, cluster, target, predicate) {
            Ok(moved) => {
                tracing::debug!(?cluster, moved, "relocated index entries");
                moved
            }
            Err(err) => {
                tracing::trace!(%err, ?cluster, "nothing to relocate");
                0
            }
        }
    }

    fn try_erase<P>(
        &mut self,
        term: &Subterm,
        cluster: &Cluster,
        mut predicate: P,
    ) -> Result<usize, IndexError>
    where
        P: FnMut(&T) -> bool,
    {
        assert!(self.unlocked(), "index mutated during retrieval");

        if let Some(var) = term.as_variable() {
            let by_var = self
                .variables
                .get_mut(cluster)
                .ok_or(IndexError::PairNotFound)?;
            let objects = by_var.get_mut(&var).ok_or(IndexError::PairNotFound)?;
            let before = objects.len();
            objects.retain(|o| !predicate(o));
            let removed = before - objects.len();
            if objects.is_empty() {
                by_var.shift_remove(&var);
            }
            if by_var.is_empty() {
                self.variables.remove(cluster);
            }
            self.entries -= removed;
            return Ok(removed);
        }

        let (bucket, path) = self.locate(term)?;
        let terminal = *path.last().ok_or(IndexError::PairNotFound)?;
        let leaves = &mut self.nodes.get_mut(terminal).leaves;
        let objects = leaves.get_mut(cluster).ok_or(IndexError::PairNotFound)?;
        let before = objects.len();
        objects.retain(|o| !predicate(o));
        let removed = before - objects.len();
        if objects.is_empty() {
            leaves.shift_remove(cluster);
        }
        self.entries -= removed;

        let kept = self.prune(bucket, &path);
        self.renormalize(bucket, &path[..kept]);
        Ok(removed)
    }

    fn try_relocate<P>(
        &mut self,
        term: &Subterm,
        cluster: &Cluster,
        target: Cluster,
        mut predicate: P,
    ) -> Result<usize, IndexError>
    where
        P: FnMut(&T) -> bool,
    {
        assert!(self.unlocked(), "index mutated during retrieval");

        if let Some(var) = term.as_variable() {
            let by_var = self
                .variables
                .get_mut(cluster)
                .ok_or(IndexError::PairNotFound)?;
            let objects = by_var.get_mut(&var).ok_or(IndexError::PairNotFound)?;
            let (moved, kept): (Vec<T>, Vec<T>) =
                std::mem::take(objects).into_iter().partition(|o| predicate(o));
            *objects = kept;
            if objects.is_empty() {
                by_var.shift_remove(&var);
            }
            if by_var.is_empty() {
                self.variables.remove(cluster);
            }
            let count = moved.len();
            if count > 0 {
                self.variables
                    .entry(target)
                    .or_default()
                    .entry(var)
                    .or_default()
                    .extend(moved);
            }
            return Ok(count);
        }

        let (bucket, path) = self.locate(term)?;
        let terminal = *path.last().ok_or(IndexError::PairNotFound)?;
        let leaves = &mut self.nodes.get_mut(terminal).leaves;
        let objects = leaves.get_mut(cluster).ok_or(IndexError::PairNotFound)?;
        let (moved, kept): (Vec<T>, Vec<T>) =
            std::mem::take(objects).into_iter().partition(|o| predicate(o));
        *objects = kept;
        if objects.is_empty() {
            leaves.shift_remove(cluster);
        }
        let count = moved.len();
        if count > 0 {
            leaves.entry(target).or_default().extend(moved);
        }

        self.renormalize(bucket, &path);
        Ok(count)
    }

    /// Bucket and node path spelling `term`
    pub(super) fn locate(&self, term: &Subterm) -> Result<(usize, Vec<NodeId>), IndexError> {
        let bucket = self.bucket_of(term.symbol());
        let mut path = Vec::with_capacity(term.len());
        let mut parent = None;
        for symbol in term.symbols() {
            let at = self
                .find_child(bucket, parent, symbol)
                .map_err(|_| IndexError::PairNotFound)?;
            let id = self.siblings(bucket, parent)[at];
            path.push(id);
            parent = Some(id);
        }
        Ok((bucket, path))
    }

    /// Free the dead tail of `path`. Returns the length of the surviving
    /// prefix.
    fn prune(&mut self, bucket: usize, path: &[NodeId]) -> usize {
        let mut kept = path.len();
        while kept > 0 {
            let id = path[kept - 1];
            if !self.nodes.get(id).is_dead() {
                break;
            }
            let parent = kept.checked_sub(2).map(|i| path[i]);
            self.siblings_mut(bucket, parent).retain(|c| *c != id);
            self.nodes.release(id);
            kept -= 1;
        }
        kept
    }

    /// Recompute the cluster summaries along `path` and the bit tests of
    /// every node whose parent summary may have changed.
    fn renormalize(&mut self, bucket: usize, path: &[NodeId]) {
        for &id in path.iter().rev() {
            let summary = self.derive_summary(id);
            self.nodes.get_mut(id).summary = summary;
        }
        let roots = self.buckets[bucket].roots.clone();
        let summary = {
            let summaries: Vec<&ClusterSummary> =
                roots.iter().map(|&r| &self.nodes.get(r).summary).collect();
            ClusterSummary::merge(&summaries)
        };
        self.buckets[bucket].summary = summary.clone();
        self.retest(&summary, &roots);

        for &id in path {
            let node = self.nodes.get(id);
            let (summary, children) = (node.summary.clone(), node.children.clone());
            self.retest(&summary, &children);
        }
    }

    fn derive_summary(&self, id: NodeId) -> ClusterSummary {
        let node = self.nodes.get(id);
        if node.is_terminal() {
            ClusterSummary::of(node.leaves.keys())
        } else {
            let summaries: Vec<&ClusterSummary> = node
                .children
                .iter()
                .map(|&c| &self.nodes.get(c).summary)
                .collect();
            ClusterSummary::merge(&summaries)
        }
    }

    fn retest(&mut self, parent: &ClusterSummary, children: &[NodeId]) {
        for &child in children {
            let node = self.nodes.get_mut(child);
            node.test = ClusterTest::between(parent, &node.summary);
        }
    }

    /// Panics if the tree breaks sibling order, holds dead nodes or carries
    /// stale summaries or bit tests.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let mut entries = self
            .variables
            .values()
            .flat_map(|by_var| by_var.values())
            .map(|objects| {
                assert!(!objects.is_empty(), "empty variable leaf chain");
                objects.len()
            })
            .sum::<usize>();
        let mut live = 0;

        for bucket in &self.buckets {
            let mut pending: Vec<(&ClusterSummary, &[NodeId])> =
                vec![(&bucket.summary, bucket.roots.as_slice())];
            let roots: Vec<&ClusterSummary> = bucket
                .roots
                .iter()
                .map(|&r| &self.nodes.get(r).summary)
                .collect();
            assert_eq!(bucket.summary, ClusterSummary::merge(&roots));

            while let Some((parent, siblings)) = pending.pop() {
                for pair in siblings.windows(2) {
                    let (a, b) = (self.nodes.get(pair[0]), self.nodes.get(pair[1]));
                    assert_eq!(
                        super::node::symbol_order(a.symbol, b.symbol),
                        std::cmp::Ordering::Less,
                        "siblings out of order"
                    );
                }
                for &id in siblings {
                    live += 1;
                    let node = self.nodes.get(id);
                    assert!(!node.is_dead(), "dead node left in tree");
                    assert!(
                        node.leaves.is_empty() || node.children.is_empty(),
                        "leaves on an inner node"
                    );
                    assert_eq!(node.summary, self.derive_summary(id), "stale summary");
                    assert_eq!(node.test, ClusterTest::between(parent, &node.summary));
                    entries += node.leaves.values().map(Vec::len).sum::<usize>();
                    pending.push((&node.summary, node.children.as_slice()));
                }
            }
        }
        assert_eq!(entries, self.entries, "entry count drifted");
        assert_eq!(live, self.nodes.live(), "unreachable nodes in arena");
    }
}
