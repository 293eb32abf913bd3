//! Term and literal orderings

pub mod kbo;
pub mod literal;
pub mod weight;

#[cfg(test)]
mod proptest_tests;

pub use kbo::{KboConfig, KboSettings, NonrecursiveKbo, TermOrdering};
pub use literal::{
    compare_equality_atoms, compare_negative_with_positive_equality, maximal_literals,
    AdmissibleLiteralOrdering, LiteralOrdering, ShallowWeightOrdering,
};
pub use weight::{WeightComparison, WeightPolynomial};
