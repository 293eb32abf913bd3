//! One-way matching
//!
//! `pattern` matches `target` when some instantiation of the pattern's
//! variables makes it syntactically equal to the target. Only pattern-side
//! variables are bound; the target is taken literally. All three flavors
//! reject quantifiers and abstractions on either side and leave the ledger
//! exactly as they found it when they fail.

use super::substitution::{MatcherSubstitution, TermSubstitution, UnifierSubstitution};
use crate::logic::core::term::Term;
use crate::logic::flatterm::{FlatSymbol, Subterm};

/// Matching into the unifier ledger.
///
/// A binding whose target contains the variable itself is refused, which
/// keeps the ledger acyclic for later unification. Existing bindings are
/// compared modulo the ledger.
pub fn match_unifier(pattern: &Subterm, target: &Subterm, subst: &mut UnifierSubstitution) -> bool {
    let savepoint = subst.savepoint();
    let mut pairs = vec![(pattern.clone(), target.clone())];
    while let Some((p, t)) = pairs.pop() {
        let ok = match p.symbol() {
            FlatSymbol::Variable(v) => match subst.get(v) {
                Some(instance) => subst.equal(instance, &t),
                None if t.contains_variable(v) || !t.is_quantifier_free() => false,
                None => {
                    subst.bind(v, t);
                    true
                }
            },
            s if s.is_binder() => false,
            s if s == t.symbol() => {
                pairs.extend(p.args().zip(t.args()));
                true
            }
            _ => false,
        };
        if !ok {
            subst.backtrack_to(savepoint);
            return false;
        }
    }
    true
}

/// Matching into the one-level ledger. Cyclic bindings such as `X -> f(X)`
/// are allowed.
pub fn match_flat(pattern: &Subterm, target: &Subterm, subst: &mut MatcherSubstitution) -> bool {
    let savepoint = subst.savepoint();
    let mut pairs = vec![(pattern.clone(), target.clone())];
    while let Some((p, t)) = pairs.pop() {
        let ok = match p.symbol() {
            FlatSymbol::Variable(v) => match subst.get(v) {
                Some(instance) => *instance == t,
                None if !t.is_quantifier_free() => false,
                None => {
                    subst.bind(v, t);
                    true
                }
            },
            s if s.is_binder() => false,
            s if s == t.symbol() => {
                pairs.extend(p.args().zip(t.args()));
                true
            }
            _ => false,
        };
        if !ok {
            subst.backtrack_to(savepoint);
            return false;
        }
    }
    true
}

/// Matching of tree terms into the tree-term ledger.
pub fn match_term(pattern: &Term, target: &Term, subst: &mut TermSubstitution) -> bool {
    let savepoint = subst.savepoint();
    let mut pairs = vec![(pattern, target)];
    while let Some((p, t)) = pairs.pop() {
        let ok = match p.head() {
            FlatSymbol::Variable(v) => match subst.get(v) {
                Some(instance) => instance == t,
                None if !t.is_quantifier_free() => false,
                None => {
                    subst.bind(v, t.clone());
                    true
                }
            },
            s if s.is_binder() => false,
            s if s == t.head() => {
                pairs.extend(p.args().iter().zip(t.args()));
                true
            }
            _ => false,
        };
        if !ok {
            subst.backtrack_to(savepoint);
            return false;
        }
    }
    true
}
