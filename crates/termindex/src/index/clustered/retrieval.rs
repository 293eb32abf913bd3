//! Unification retrieval from the clustered discrimination tree.
//!
//! The search is a depth-first walk over tree nodes driven by an explicit
//! stack of choice points, one per tree level entered. Each choice point
//! remembers the next sibling to try together with the query iterator and
//! ledger savepoints to restore before trying it.
//!
//! The query side is walked with an [`InstanceIterator`], so query variables
//! bound earlier in the walk are seen through. Three kinds of steps consume a
//! tree node:
//!
//! - an index variable swallows the whole current query subterm and is
//!   unified with it;
//! - an index symbol equal to the current query symbol just advances both;
//! - an index symbol met by an unbound query variable starts a *tree path
//!   term*: the walk keeps descending, collecting symbols, until the path
//!   spells one complete subterm. That subterm is materialized and bound to
//!   the query variable. Every way of completing the path is a separate
//!   branch of the search.
//!
//! After the tree is exhausted the variable index of the query cluster is
//! swept: each indexed variable unifies with the query as a whole.

use super::node::{symbol_order, NodeId};
use super::ClusteredIndex;
use crate::index::cluster::Cluster;
use crate::logic::core::term::Variable;
use crate::logic::flatterm::{FlatSymbol, Subterm};
use crate::logic::unification::{
    subterm_from_symbols, unify_variable, InstanceIterator, IterSavepoint, Savepoint,
    UnifierSubstitution,
};
use std::cmp::Ordering;

/// Where the candidates of a choice point come from
#[derive(Debug, Clone, Copy)]
enum Siblings {
    Bucket(usize),
    /// Roots of every admissible bucket, for a variable query
    AllRoots,
    Children(NodeId),
}

/// Progress of a tree path term
#[derive(Debug, Clone, Copy)]
struct PathMark {
    /// Query variable receiving the path's subterm
    var: Variable,
    /// Where the path's symbols begin in the shared symbol buffer
    start: usize,
    /// Subterms still missing to complete the path
    open: usize,
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Query,
    Path(PathMark),
}

#[derive(Debug, Clone)]
struct ChoicePoint {
    siblings: Siblings,
    next: usize,
    iter: IterSavepoint,
    subst: Savepoint,
    /// Length of the path symbol buffer when the choice point was made
    path: usize,
    mode: Mode,
}

enum Step {
    Descend(Mode),
    Skip,
    /// No later sibling can match either
    Exhausted,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Tree,
    Variables { entry: usize, object: usize },
    Done,
}

/// A unification retrieval cursor.
///
/// `reset_query` starts a query; each `retrieve_next` returns one more object
/// whose key term unifies with the query under the query cluster, leaving the
/// unifier in the ledger until the following call. `finish` rolls the ledger
/// back to where the query started and releases the index.
///
/// Index and query variables must come from different banks.
#[derive(Debug)]
pub struct Retrieval<'a, T> {
    index: &'a ClusteredIndex<T>,
    locked: bool,
    phase: Phase,
    query: Option<Subterm>,
    cluster: Cluster,
    start: Savepoint,
    iter: InstanceIterator,
    stack: Vec<ChoicePoint>,
    path: Vec<FlatSymbol>,
    roots: Vec<NodeId>,
    // objects of the leaf reached last, and the next one to report
    pending: Option<(&'a [T], usize)>,
}

impl<'a, T> Retrieval<'a, T> {
    pub fn new(index: &'a ClusteredIndex<T>) -> Self {
        Retrieval {
            index,
            locked: false,
            phase: Phase::Idle,
            query: None,
            cluster: Cluster::new(),
            start: Savepoint::default(),
            iter: InstanceIterator::default(),
            stack: Vec::new(),
            path: Vec::new(),
            roots: Vec::new(),
            pending: None,
        }
    }

    pub fn reset_query(
        &mut self,
        query: &Subterm,
        cluster: &Cluster,
        subst: &mut UnifierSubstitution,
    ) {
        debug_assert!(query.is_quantifier_free(), "quantified query term");
        if self.locked {
            self.finish(subst);
        }
        self.index.lock();
        self.locked = true;
        tracing::trace!(?cluster, "retrieval opened");

        self.start = subst.savepoint();
        self.cluster = cluster.clone();
        self.iter.reset(query);
        self.phase = Phase::Tree;

        let head = subst.deref(query);
        let siblings = match head.symbol() {
            FlatSymbol::Variable(_) => {
                let index = self.index;
                self.roots = index
                    .buckets
                    .iter()
                    .filter(|b| !b.roots.is_empty() && b.summary.admits(cluster))
                    .flat_map(|b| b.roots.iter().copied())
                    .collect();
                Some(Siblings::AllRoots)
            }
            symbol => {
                let bucket = self.index.bucket_of(symbol);
                let entry = &self.index.buckets[bucket];
                (!entry.roots.is_empty() && entry.summary.admits(cluster))
                    .then_some(Siblings::Bucket(bucket))
            }
        };
        if let Some(siblings) = siblings {
            self.stack.push(ChoicePoint {
                siblings,
                next: 0,
                iter: self.iter.savepoint(),
                subst: subst.savepoint(),
                path: 0,
                mode: Mode::Query,
            });
        }
        self.query = Some(head);
    }

    /// The next object whose key term unifies with the query
    pub fn retrieve_next(&mut self, subst: &mut UnifierSubstitution) -> Option<&'a T> {
        loop {
            match self.phase {
                Phase::Idle | Phase::Done => return None,
                Phase::Tree => {
                    if let Some((objects, next)) = self.pending {
                        if let Some(object) = objects.get(next) {
                            self.pending = Some((objects, next + 1));
                            return Some(object);
                        }
                        self.pending = None;
                    }
                    match self.advance(subst) {
                        Some(objects) => self.pending = Some((objects, 0)),
                        None => {
                            subst.backtrack_to(self.start);
                            self.phase = Phase::Variables {
                                entry: 0,
                                object: 0,
                            };
                        }
                    }
                }
                Phase::Variables { entry, object } => {
                    let index = self.index;
                    let Some((&var, objects)) = index
                        .variables
                        .get(&self.cluster)
                        .and_then(|by_var| by_var.get_index(entry))
                    else {
                        subst.backtrack_to(self.start);
                        self.phase = Phase::Done;
                        return None;
                    };
                    if object == 0 {
                        subst.backtrack_to(self.start);
                        let unified = match &self.query {
                            Some(query) => unify_variable(var, query, subst),
                            None => false,
                        };
                        if !unified {
                            self.phase = Phase::Variables {
                                entry: entry + 1,
                                object: 0,
                            };
                            continue;
                        }
                    }
                    match objects.get(object) {
                        Some(found) => {
                            self.phase = Phase::Variables {
                                entry,
                                object: object + 1,
                            };
                            return Some(found);
                        }
                        None => {
                            self.phase = Phase::Variables {
                                entry: entry + 1,
                                object: 0,
                            }
                        }
                    }
                }
            }
        }
    }

    /// Undo the query's bindings and release the index
    pub fn finish(&mut self, subst: &mut UnifierSubstitution) {
        if !matches!(self.phase, Phase::Idle) {
            subst.backtrack_to(self.start);
        }
        self.phase = Phase::Idle;
        self.query = None;
        self.iter.clear();
        self.stack.clear();
        self.path.clear();
        self.roots.clear();
        self.pending = None;
        if self.locked {
            self.locked = false;
            self.index.unlock();
            tracing::trace!("retrieval closed");
        }
    }

    /// Run the search to the next terminal node holding objects of the
    /// query cluster
    fn advance(&mut self, subst: &mut UnifierSubstitution) -> Option<&'a [T]> {
        let index = self.index;
        loop {
            let top = self.stack.last_mut()?;
            let candidate = match top.siblings {
                Siblings::Bucket(b) => index.buckets[b].roots.get(top.next).copied(),
                Siblings::AllRoots => self.roots.get(top.next).copied(),
                Siblings::Children(id) => index.nodes.get(id).children.get(top.next).copied(),
            };
            let Some(candidate) = candidate else {
                self.stack.pop();
                continue;
            };
            top.next += 1;
            let (iter_sp, subst_sp, path_len, mode) = (top.iter, top.subst, top.path, top.mode);

            self.iter.backtrack_to(iter_sp);
            subst.backtrack_to(subst_sp);
            self.path.truncate(path_len);

            let node = index.nodes.get(candidate);
            if !node.test.passes(&self.cluster) {
                continue;
            }
            let mode = match self.step(node.symbol, mode, subst) {
                Step::Descend(mode) => mode,
                Step::Skip => continue,
                Step::Exhausted => {
                    self.stack.pop();
                    continue;
                }
            };

            if node.is_terminal() {
                debug_assert!(matches!(mode, Mode::Query) && !self.iter.has_next());
                match node.leaves.get(&self.cluster) {
                    Some(objects) if !objects.is_empty() => return Some(objects.as_slice()),
                    _ => continue,
                }
            }
            self.stack.push(ChoicePoint {
                siblings: Siblings::Children(candidate),
                next: 0,
                iter: self.iter.savepoint(),
                subst: subst.savepoint(),
                path: self.path.len(),
                mode,
            });
        }
    }

    /// Consume one tree node
    fn step(&mut self, symbol: FlatSymbol, mode: Mode, subst: &mut UnifierSubstitution) -> Step {
        match mode {
            Mode::Path(mark) => self.extend_path(symbol, mark, subst),
            Mode::Query => {
                let Some(query) = self.iter.peek(subst) else {
                    return Step::Exhausted;
                };
                match (symbol, query.symbol()) {
                    (FlatSymbol::Variable(var), _) => {
                        self.iter.next(subst);
                        self.iter.skip_arguments();
                        if unify_variable(var, &query, subst) {
                            Step::Descend(Mode::Query)
                        } else {
                            Step::Skip
                        }
                    }
                    (_, FlatSymbol::Variable(var)) => {
                        self.iter.next(subst);
                        self.iter.skip_arguments();
                        let mark = PathMark {
                            var,
                            start: self.path.len(),
                            open: 1,
                        };
                        self.extend_path(symbol, mark, subst)
                    }
                    (s, q) if s == q => {
                        self.iter.next(subst);
                        Step::Descend(Mode::Query)
                    }
                    (s, q) => match symbol_order(s, q) {
                        Ordering::Greater => Step::Exhausted,
                        _ => Step::Skip,
                    },
                }
            }
        }
    }

    fn extend_path(
        &mut self,
        symbol: FlatSymbol,
        mut mark: PathMark,
        subst: &mut UnifierSubstitution,
    ) -> Step {
        self.path.push(symbol);
        mark.open = mark.open - 1 + symbol.arity();
        if mark.open > 0 {
            return Step::Descend(Mode::Path(mark));
        }
        let instance = subterm_from_symbols(self.path[mark.start..].iter().copied());
        if unify_variable(mark.var, &instance, subst) {
            Step::Descend(Mode::Query)
        } else {
            Step::Skip
        }
    }
}

impl<T> Drop for Retrieval<'_, T> {
    fn drop(&mut self) {
        if self.locked {
            self.index.unlock();
        }
    }
}
