//! Clause subsumption.
//!
//! A clause C subsumes a clause D if some substitution σ maps the literals of
//! C injectively onto literals of D: every literal of Cσ is a distinct
//! literal of D. Equality literals match in either orientation.
//!
//! [`subsumes`] searches for σ with an explicit stack of choice frames, one
//! per literal of C. [`SubsumptionIndex`] stores clauses under their feature
//! vectors and runs the full test only on candidates passing the feature
//! filter.

use crate::index::feature_vector::{FeatureExtractor, FeatureVectorIndex};
use crate::logic::core::clause::Clause;
use crate::logic::core::literal::Literal;
use crate::logic::core::term::Term;
use crate::logic::unification::{match_term, Savepoint, TermSubstitution};

// =============================================================================
// Subsumption test
// =============================================================================

#[derive(Debug)]
struct Frame {
    // next candidate: literal index * 2 + orientation
    next: usize,
    savepoint: Savepoint,
    chosen: Option<usize>,
}

impl Frame {
    fn new(savepoint: Savepoint) -> Self {
        Frame {
            next: 0,
            savepoint,
            chosen: None,
        }
    }
}

/// Does `subsumer` subsume `subsumee`?
///
/// On success the ledger holds the matching substitution; on failure it is
/// back where it was on entry. The empty clause subsumes every clause.
pub fn subsumes(subsumer: &Clause, subsumee: &Clause, subst: &mut TermSubstitution) -> bool {
    let (c, d) = (&subsumer.literals, &subsumee.literals);
    if c.len() > d.len() {
        return false;
    }
    if c.is_empty() {
        return true;
    }

    let start = subst.savepoint();
    let mut used = vec![false; d.len()];
    let mut frames = Vec::with_capacity(c.len());
    frames.push(Frame::new(start));

    loop {
        let depth = frames.len() - 1;
        let frame = &mut frames[depth];
        if let Some(j) = frame.chosen.take() {
            used[j] = false;
        }
        subst.backtrack_to(frame.savepoint);

        let lit = &c[depth];
        let mut chosen = None;
        while frame.next < 2 * d.len() {
            let (j, flipped) = (frame.next / 2, frame.next % 2 == 1);
            frame.next += 1;
            if used[j] || (flipped && !lit.is_equality()) {
                continue;
            }
            if match_literal(lit, &d[j], flipped, subst) {
                chosen = Some(j);
                break;
            }
        }

        match chosen {
            Some(j) => {
                frame.chosen = Some(j);
                used[j] = true;
                if depth + 1 == c.len() {
                    return true;
                }
                frames.push(Frame::new(subst.savepoint()));
            }
            None => {
                frames.pop();
                if frames.is_empty() {
                    subst.backtrack_to(start);
                    return false;
                }
            }
        }
    }
}

/// Match `pattern` onto `target`, with the sides of an equality swapped if
/// `flipped`
fn match_literal(
    pattern: &Literal,
    target: &Literal,
    flipped: bool,
    subst: &mut TermSubstitution,
) -> bool {
    if pattern.polarity != target.polarity {
        return false;
    }
    if !flipped {
        return match_term(&pattern.atom, &target.atom, subst);
    }
    let (Term::Atom(p, ps), Term::Atom(q, qs)) = (&pattern.atom, &target.atom) else {
        return false;
    };
    if p != q || !p.is_equality() {
        return false;
    }
    let savepoint = subst.savepoint();
    if match_term(&ps[0], &qs[1], subst) && match_term(&ps[1], &qs[0], subst) {
        return true;
    }
    subst.backtrack_to(savepoint);
    false
}

// =============================================================================
// SubsumptionIndex
// =============================================================================

/// Clauses stored under their feature vectors.
///
/// Forward queries ([`find_subsumer`](Self::find_subsumer)) walk the stored
/// vectors componentwise below the query's; backward queries
/// ([`find_subsumed`](Self::find_subsumed)) walk those above it.
#[derive(Debug)]
pub struct SubsumptionIndex {
    extractor: FeatureExtractor,
    vectors: FeatureVectorIndex<Vec<usize>>,
    clauses: Vec<Option<(Clause, Vec<u32>)>>,
    live: usize,
}

impl SubsumptionIndex {
    pub fn new(extractor: FeatureExtractor) -> Self {
        SubsumptionIndex {
            extractor,
            vectors: FeatureVectorIndex::new(),
            clauses: Vec::new(),
            live: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn get(&self, id: usize) -> Option<&Clause> {
        self.clauses.get(id)?.as_ref().map(|(clause, _)| clause)
    }

    /// Store a clause, returning its id
    pub fn add(&mut self, clause: Clause) -> usize {
        let id = self.clauses.len();
        let features = self.extractor.extract(&clause);
        self.vectors
            .insert(&features)
            .get_or_insert_with(Vec::new)
            .push(id);
        self.clauses.push(Some((clause, features)));
        self.live += 1;
        id
    }

    pub fn remove(&mut self, id: usize) -> Option<Clause> {
        let (clause, features) = self.clauses.get_mut(id)?.take()?;
        let emptied = match self.vectors.find_mut(&features) {
            Some(ids) => {
                ids.retain(|&other| other != id);
                ids.is_empty()
            }
            None => false,
        };
        if emptied {
            self.vectors.remove(&features);
        }
        self.live -= 1;
        Some(clause)
    }

    /// Id of a stored clause subsuming `clause`
    pub fn find_subsumer(&self, clause: &Clause) -> Option<usize> {
        let features = self.extractor.extract(clause);
        let mut subst = TermSubstitution::new();
        let mut cursor = self.vectors.subsuming();
        cursor.reset(&features);
        while let Some(ids) = cursor.next() {
            for &id in ids {
                let Some(stored) = self.get(id) else {
                    continue;
                };
                if subsumes(stored, clause, &mut subst) {
                    tracing::debug!(subsumer = id, "forward subsumption");
                    return Some(id);
                }
            }
        }
        None
    }

    /// Ids of stored clauses subsumed by `clause`, a stored copy of `clause`
    /// included
    pub fn find_subsumed(&self, clause: &Clause) -> Vec<usize> {
        let features = self.extractor.extract(clause);
        let mut subst = TermSubstitution::new();
        let mut cursor = self.vectors.subsumed();
        cursor.reset(&features);
        let mut found = Vec::new();
        while let Some(ids) = cursor.next() {
            for &id in ids {
                let Some(stored) = self.get(id) else {
                    continue;
                };
                if subsumes(clause, stored, &mut subst) {
                    found.push(id);
                }
                subst.clear();
            }
        }
        if !found.is_empty() {
            tracing::debug!(count = found.len(), "backward subsumption");
        }
        found
    }
}
