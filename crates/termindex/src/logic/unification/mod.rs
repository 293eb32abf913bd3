//! Substitution ledgers, flatterm iterators, unification and matching

pub mod iterator;
mod matching;
pub mod mgu;
pub mod substitution;


pub use iterator::{FlatIterator, InstanceIterator, IterSavepoint};
pub use matching::{match_flat, match_term, match_unifier};
pub use mgu::{possibly_unify, unify, unify_variable, UnificationError};
pub use substitution::{
    subterm_from_symbols, Flavor, Matcher, MatcherSubstitution, Savepoint, Substitution,
    TermMatcher, TermSubstitution, Unifier, UnifierSubstitution,
};
