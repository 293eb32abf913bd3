//! First-order logic representation and manipulation
//!
//! Terms come in two shapes: tree-shaped [`Term`]s, and [`Flatterm`]s that
//! store a term as a contiguous prefix-order cell sequence. Unification,
//! matching and the orderings work on both without recursing on term depth.

pub mod core;
pub mod flatterm;
pub mod interner;
pub mod ordering;
pub mod unification;

#[cfg(test)]
pub(crate) mod arbitrary;

// Re-export commonly used types
pub use core::clause::{Clause, ClauseDisplay};
pub use core::literal::{FlatLiteral, Literal, LiteralDisplay};
pub use core::term::{Connective, Quantifier, Symbol, SymbolKind, Term, TermDisplay, Variable};
pub use flatterm::{Cell, FlatSymbol, Flatterm, Subterm};
pub use interner::{BankId, Signature, SymbolId, VariableBank};
pub use ordering::{
    AdmissibleLiteralOrdering, KboConfig, KboSettings, LiteralOrdering, NonrecursiveKbo,
    ShallowWeightOrdering, TermOrdering,
};
pub use unification::{
    match_flat, match_term, match_unifier, possibly_unify, unify, unify_variable,
    MatcherSubstitution, Savepoint, TermSubstitution, UnifierSubstitution,
};
