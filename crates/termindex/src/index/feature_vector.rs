//! Feature vector indexing for subsumption filtering.
//!
//! Feature vectors give a necessary condition for subsumption: if clause C
//! subsumes clause D, then feature(C) <= feature(D) componentwise. The index
//! is a trie over fixed-length vectors of counts; the [`Subsuming`] and
//! [`Subsumed`] cursors enumerate stored vectors below or above a query.

use crate::logic::core::clause::Clause;
use crate::logic::core::term::{Symbol, SymbolKind};
use crate::logic::flatterm::FlatSymbol;
use std::collections::HashMap;

// =============================================================================
// Feature extraction
// =============================================================================

/// Maps a fixed set of symbols to feature positions.
///
/// Vectors are laid out as `[literals, positive literals, negative literals,
/// pos_pred_0, neg_pred_0, pos_pred_1, neg_pred_1, ..., fun_0, fun_1, ...]`.
/// Symbols outside the table are not counted.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    predicates: HashMap<Symbol, usize>,
    functions: HashMap<Symbol, usize>,
    dimension: usize,
}

const FIXED_FEATURES: usize = 3;

impl FeatureExtractor {
    pub fn new(
        predicates: impl IntoIterator<Item = Symbol>,
        functions: impl IntoIterator<Item = Symbol>,
    ) -> Self {
        let mut extractor = FeatureExtractor {
            dimension: FIXED_FEATURES,
            ..Default::default()
        };
        for p in predicates {
            extractor.add_predicate(p);
        }
        for f in functions {
            extractor.add_function(f);
        }
        extractor
    }

    /// Table of every predicate and function symbol occurring in `clauses`
    pub fn from_clauses(clauses: &[Clause]) -> Self {
        let mut extractor = FeatureExtractor {
            dimension: FIXED_FEATURES,
            ..Default::default()
        };
        for clause in clauses {
            for lit in &clause.literals {
                extractor.add_predicate(lit.predicate());
                for symbol in lit.args().iter().flat_map(|arg| arg.symbols()) {
                    if let Some(f) = counted_function(symbol) {
                        extractor.add_function(f);
                    }
                }
            }
        }
        extractor
    }

    fn add_predicate(&mut self, predicate: Symbol) {
        if !self.predicates.contains_key(&predicate) {
            self.predicates.insert(predicate, self.dimension);
            self.dimension += 2;
        }
    }

    fn add_function(&mut self, function: Symbol) {
        if !self.functions.contains_key(&function) {
            self.functions.insert(function, self.dimension);
            self.dimension += 1;
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension.max(FIXED_FEATURES)
    }

    pub fn extract(&self, clause: &Clause) -> Vec<u32> {
        let mut features = vec![0u32; self.dimension()];
        features[0] = clause.len() as u32;
        for lit in &clause.literals {
            features[if lit.polarity { 1 } else { 2 }] += 1;
            if let Some(&base) = self.predicates.get(&lit.predicate()) {
                features[if lit.polarity { base } else { base + 1 }] += 1;
            }
            for symbol in lit.args().iter().flat_map(|arg| arg.symbols()) {
                if let Some(&idx) = counted_function(symbol).and_then(|f| self.functions.get(&f)) {
                    features[idx] += 1;
                }
            }
        }
        features
    }
}

fn counted_function(symbol: FlatSymbol) -> Option<Symbol> {
    match symbol {
        FlatSymbol::Symbol(s)
            if matches!(s.kind, SymbolKind::Function | SymbolKind::IndividualConstant) =>
        {
            Some(s)
        }
        _ => None,
    }
}

// =============================================================================
// Trie
// =============================================================================

#[derive(Debug, Clone)]
enum FvNode<T> {
    /// One value at one feature position. Siblings ascend along `greater`.
    Inner {
        value: u32,
        below: Option<usize>,
        greater: Option<usize>,
    },
    Leaf(Option<T>),
}

/// Where a node handle is stored
#[derive(Debug, Clone, Copy)]
enum Link {
    Head,
    Below(usize),
    Greater(usize),
}

/// Trie keyed by vectors of a fixed length.
///
/// The length is fixed by the first insertion; vectors of any other length
/// are rejected with a panic.
#[derive(Debug, Clone)]
pub struct FeatureVectorIndex<T> {
    nodes: Vec<FvNode<T>>,
    free: Vec<usize>,
    head: Option<usize>,
    features: Option<usize>,
}

impl<T> Default for FeatureVectorIndex<T> {
    fn default() -> Self {
        FeatureVectorIndex {
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            features: None,
        }
    }
}

impl<T> FeatureVectorIndex<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vector length, once fixed
    pub fn features(&self) -> Option<usize> {
        self.features
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Find or create the slot of `vector`.
    ///
    /// Inserting the same vector twice returns the same slot.
    pub fn insert(&mut self, vector: &[u32]) -> &mut Option<T> {
        let n = *self.features.get_or_insert(vector.len());
        assert_eq!(vector.len(), n, "feature vector of the wrong dimension");

        let mut chain = Link::Head;
        for &value in vector {
            let mut link = chain;
            let node = loop {
                match self.follow(link) {
                    Some(id) if self.value(id) < value => link = Link::Greater(id),
                    Some(id) if self.value(id) == value => break id,
                    greater => {
                        let id = self.alloc(FvNode::Inner {
                            value,
                            below: None,
                            greater,
                        });
                        self.set(link, Some(id));
                        break id;
                    }
                }
            };
            chain = Link::Below(node);
        }

        let leaf = match self.follow(chain) {
            Some(leaf) => leaf,
            None => {
                let leaf = self.alloc(FvNode::Leaf(None));
                self.set(chain, Some(leaf));
                leaf
            }
        };
        match &mut self.nodes[leaf] {
            FvNode::Leaf(slot) => slot,
            FvNode::Inner { .. } => panic!("feature trie path ends in an inner node"),
        }
    }

    pub fn find(&self, vector: &[u32]) -> Option<&T> {
        let leaf = self.locate(vector)?.0;
        match &self.nodes[leaf] {
            FvNode::Leaf(slot) => slot.as_ref(),
            FvNode::Inner { .. } => None,
        }
    }

    pub fn find_mut(&mut self, vector: &[u32]) -> Option<&mut T> {
        let leaf = self.locate(vector)?.0;
        match &mut self.nodes[leaf] {
            FvNode::Leaf(slot) => slot.as_mut(),
            FvNode::Inner { .. } => None,
        }
    }

    /// Take the payload of `vector` and drop its path from the trie
    pub fn remove(&mut self, vector: &[u32]) -> Option<T> {
        let (leaf, mut links) = self.locate(vector)?;
        let payload = match &mut self.nodes[leaf] {
            FvNode::Leaf(slot) => slot.take(),
            FvNode::Inner { .. } => None,
        };

        // unlink the leaf, then every inner node left without a subtree
        let Some(&(leaf_link, _)) = links.last() else {
            return payload;
        };
        self.set(leaf_link, None);
        self.release(leaf);
        links.pop();
        while let Some((link, id)) = links.pop() {
            let (below, greater) = match self.nodes[id] {
                FvNode::Inner { below, greater, .. } => (below, greater),
                FvNode::Leaf(_) => break,
            };
            if below.is_some() {
                break;
            }
            self.set(link, greater);
            self.release(id);
        }
        payload
    }

    /// Leaf of `vector` and the links leading to every node on its path
    fn locate(&self, vector: &[u32]) -> Option<(usize, Vec<(Link, usize)>)> {
        if self.features != Some(vector.len()) {
            return None;
        }
        let mut links = Vec::with_capacity(vector.len() + 1);
        let mut chain = Link::Head;
        for &value in vector {
            let mut link = chain;
            let node = loop {
                let id = self.follow(link)?;
                match self.value(id).cmp(&value) {
                    std::cmp::Ordering::Less => link = Link::Greater(id),
                    std::cmp::Ordering::Equal => break id,
                    std::cmp::Ordering::Greater => return None,
                }
            };
            links.push((link, node));
            chain = Link::Below(node);
        }
        let leaf = self.follow(chain)?;
        links.push((chain, leaf));
        Some((leaf, links))
    }

    fn follow(&self, link: Link) -> Option<usize> {
        match link {
            Link::Head => self.head,
            Link::Below(id) => self.below(id),
            Link::Greater(id) => self.greater(id),
        }
    }

    fn set(&mut self, link: Link, target: Option<usize>) {
        match link {
            Link::Head => self.head = target,
            Link::Below(id) | Link::Greater(id) => {
                if let FvNode::Inner { below, greater, .. } = &mut self.nodes[id] {
                    match link {
                        Link::Below(_) => *below = target,
                        _ => *greater = target,
                    }
                }
            }
        }
    }

    fn value(&self, id: usize) -> u32 {
        match self.nodes[id] {
            FvNode::Inner { value, .. } => value,
            FvNode::Leaf(_) => panic!("leaf in a feature sibling chain"),
        }
    }

    fn below(&self, id: usize) -> Option<usize> {
        match self.nodes[id] {
            FvNode::Inner { below, .. } => below,
            FvNode::Leaf(_) => None,
        }
    }

    fn greater(&self, id: usize) -> Option<usize> {
        match self.nodes[id] {
            FvNode::Inner { greater, .. } => greater,
            FvNode::Leaf(_) => None,
        }
    }

    fn payload(&self, leaf: usize) -> Option<&T> {
        match &self.nodes[leaf] {
            FvNode::Leaf(slot) => slot.as_ref(),
            FvNode::Inner { .. } => None,
        }
    }

    fn alloc(&mut self, node: FvNode<T>) -> usize {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, id: usize) {
        self.nodes[id] = FvNode::Leaf(None);
        self.free.push(id);
    }

    pub fn subsuming(&self) -> Subsuming<'_, T> {
        Subsuming(Walk::new(self, Direction::AtMost))
    }

    pub fn subsumed(&self) -> Subsumed<'_, T> {
        Subsumed(Walk::new(self, Direction::AtLeast))
    }
}

// =============================================================================
// Cursors
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Stored values at most the query's
    AtMost,
    /// Stored values at least the query's
    AtLeast,
}

/// Depth-first walk with one backtrack point per feature position
#[derive(Debug)]
struct Walk<'a, T> {
    index: &'a FeatureVectorIndex<T>,
    direction: Direction,
    query: Vec<u32>,
    points: Vec<usize>,
    depth: usize,
    next: Option<usize>,
}

impl<'a, T> Walk<'a, T> {
    fn new(index: &'a FeatureVectorIndex<T>, direction: Direction) -> Self {
        Walk {
            index,
            direction,
            query: Vec::new(),
            points: Vec::new(),
            depth: 0,
            next: None,
        }
    }

    fn reset(&mut self, query: &[u32]) {
        self.clear();
        let Some(n) = self.index.features else {
            return;
        };
        assert_eq!(query.len(), n, "feature vector of the wrong dimension");
        self.query.extend_from_slice(query);
        self.points.resize(n, 0);
        let found = self.complete();
        self.settle(found);
    }

    fn clear(&mut self) {
        self.query.clear();
        self.points.clear();
        self.depth = 0;
        self.next = None;
    }

    fn next(&mut self) -> Option<&'a T> {
        let leaf = self.next?;
        self.settle(false);
        self.index.payload(leaf)
    }

    /// First valid node of a sibling chain
    fn first(&self, mut cur: Option<usize>, bound: u32) -> Option<usize> {
        match self.direction {
            Direction::AtMost => cur.filter(|&id| self.index.value(id) <= bound),
            Direction::AtLeast => {
                while let Some(id) = cur {
                    if self.index.value(id) >= bound {
                        return Some(id);
                    }
                    cur = self.index.greater(id);
                }
                None
            }
        }
    }

    /// Next valid sibling after `id`
    fn sibling(&self, id: usize, bound: u32) -> Option<usize> {
        let greater = self.index.greater(id);
        match self.direction {
            Direction::AtMost => greater.filter(|&g| self.index.value(g) <= bound),
            Direction::AtLeast => greater,
        }
    }

    fn chain(&self, depth: usize) -> Option<usize> {
        match depth {
            0 => self.index.head,
            d => self.index.below(self.points[d - 1]),
        }
    }

    /// Descend from the current depth to a leaf, always taking the first
    /// valid node
    fn complete(&mut self) -> bool {
        while self.depth < self.points.len() {
            let bound = self.query[self.depth];
            match self.first(self.chain(self.depth), bound) {
                Some(id) => {
                    self.points[self.depth] = id;
                    self.depth += 1;
                }
                None => return false,
            }
        }
        true
    }

    /// Move the deepest backtrack point that has one to its next valid
    /// sibling
    fn backtrack(&mut self) -> bool {
        while self.depth > 0 {
            let level = self.depth - 1;
            if let Some(sibling) = self.sibling(self.points[level], self.query[level]) {
                self.points[level] = sibling;
                return true;
            }
            self.depth = level;
        }
        false
    }

    /// Find the next leaf with a payload, starting from a completed path if
    /// `found`
    fn settle(&mut self, mut found: bool) {
        loop {
            if found {
                if let Some(leaf) = self.chain(self.depth) {
                    if self.index.payload(leaf).is_some() {
                        self.next = Some(leaf);
                        return;
                    }
                }
            }
            if !self.backtrack() {
                self.next = None;
                return;
            }
            found = self.complete();
        }
    }
}

/// Enumerates stored payloads whose vectors are componentwise at most the
/// query vector
#[derive(Debug)]
pub struct Subsuming<'a, T>(Walk<'a, T>);

/// Enumerates stored payloads whose vectors are componentwise at least the
/// query vector
#[derive(Debug)]
pub struct Subsumed<'a, T>(Walk<'a, T>);

macro_rules! cursor_api {
    ($cursor:ident) => {
        impl<'a, T> $cursor<'a, T> {
            pub fn reset(&mut self, query: &[u32]) {
                self.0.reset(query)
            }

            pub fn has_next(&self) -> bool {
                self.0.next.is_some()
            }

            pub fn next(&mut self) -> Option<&'a T> {
                self.0.next()
            }

            pub fn clear(&mut self) {
                self.0.clear()
            }
        }
    };
}

cursor_api!(Subsuming);
cursor_api!(Subsumed);
