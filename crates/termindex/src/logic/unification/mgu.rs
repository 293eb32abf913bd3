//! Most general unifiers over flatterms

use super::iterator::FlatIterator;
use super::substitution::UnifierSubstitution;
use crate::logic::core::term::Variable;
use crate::logic::flatterm::{FlatSymbol, Subterm};

/// Why a unification attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnificationError {
    /// Occurs check failed - variable occurs in the term it would be bound to
    OccursCheck(Variable),
    /// Different symbols at the same position
    SymbolClash(FlatSymbol, FlatSymbol),
    /// Quantifiers and abstractions do not unify
    Binder,
}

/// Unify two subterms, extending the ledger with a most general unifier.
///
/// On failure the ledger is rolled back to its state on entry.
pub fn unify(a: &Subterm, b: &Subterm, subst: &mut UnifierSubstitution) -> bool {
    let savepoint = subst.savepoint();
    match unify_pairs(vec![(a.clone(), b.clone())], subst) {
        Ok(()) => true,
        Err(err) => {
            tracing::trace!(?err, "unification failed");
            subst.backtrack_to(savepoint);
            false
        }
    }
}

/// Unify a variable with a subterm
pub fn unify_variable(var: Variable, term: &Subterm, subst: &mut UnifierSubstitution) -> bool {
    unify(&Subterm::variable(var), term, subst)
}

fn unify_pairs(
    mut pairs: Vec<(Subterm, Subterm)>,
    subst: &mut UnifierSubstitution,
) -> Result<(), UnificationError> {
    while let Some((a, b)) = pairs.pop() {
        let a = subst.deref(&a);
        let b = subst.deref(&b);
        match (a.symbol(), b.symbol()) {
            (FlatSymbol::Variable(u), FlatSymbol::Variable(v)) if u == v => {}
            (FlatSymbol::Variable(v), _) => bind_checked(v, b, subst)?,
            (_, FlatSymbol::Variable(v)) => bind_checked(v, a, subst)?,
            (x, y) if x.is_binder() || y.is_binder() => return Err(UnificationError::Binder),
            (x, y) if x != y => return Err(UnificationError::SymbolClash(x, y)),
            _ => pairs.extend(a.args().zip(b.args())),
        }
    }
    Ok(())
}

fn bind_checked(
    var: Variable,
    term: Subterm,
    subst: &mut UnifierSubstitution,
) -> Result<(), UnificationError> {
    if subst.occurs(var, &term) {
        return Err(UnificationError::OccursCheck(var));
    }
    subst.bind(var, term);
    Ok(())
}

/// Cheap structural prefilter: false means the subterms cannot unify.
///
/// Walks both cell sequences in lockstep; a variable on either side skips the
/// whole subterm on the other side. No substitution is built, so repeated
/// variables are not checked for consistency.
pub fn possibly_unify(a: &Subterm, b: &Subterm) -> bool {
    let mut left = FlatIterator::new(a);
    let mut right = FlatIterator::new(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) => match (x.symbol(), y.symbol()) {
                (FlatSymbol::Variable(_), FlatSymbol::Variable(_)) => {}
                (FlatSymbol::Variable(_), _) => right.skip_arguments(),
                (_, FlatSymbol::Variable(_)) => left.skip_arguments(),
                (s, t) if s != t => return false,
                _ => {}
            },
            _ => return false,
        }
    }
}
