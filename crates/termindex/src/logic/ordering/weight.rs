//! Weight polynomials for KBO.
//!
//! The weight of a non-ground term depends on what its variables are
//! instantiated with. Each variable occurrence contributes the minimal
//! variable weight to the constant part plus one unit of an unknown
//! `y_X >= 0` (the excess of the instance over the minimum), so a weight is
//! `c + sum(k_X * y_X)` and comparing two of them means reasoning about the
//! sign of their difference over all non-negative `y`.

use crate::logic::core::term::Variable;
use std::collections::HashMap;

/// Outcome of comparing two weight polynomials over all instantiations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeightComparison {
    AlwaysSmaller,
    CanBeSmallerOrEquivalent,
    AlwaysEquivalent,
    CanBeGreaterOrEquivalent,
    AlwaysGreater,
    /// The sign of the difference depends on the instantiation
    Volatile,
}

impl WeightComparison {
    pub fn flip(self) -> Self {
        match self {
            WeightComparison::AlwaysSmaller => WeightComparison::AlwaysGreater,
            WeightComparison::CanBeSmallerOrEquivalent => WeightComparison::CanBeGreaterOrEquivalent,
            WeightComparison::AlwaysEquivalent => WeightComparison::AlwaysEquivalent,
            WeightComparison::CanBeGreaterOrEquivalent => WeightComparison::CanBeSmallerOrEquivalent,
            WeightComparison::AlwaysGreater => WeightComparison::AlwaysSmaller,
            WeightComparison::Volatile => WeightComparison::Volatile,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeightPolynomial {
    constant: i64,
    coefficients: HashMap<Variable, i64>,
}

impl WeightPolynomial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_weight(&mut self, weight: i64) {
        self.constant += weight;
    }

    /// Count one more occurrence of `var`
    pub fn add_variable(&mut self, var: Variable) {
        *self.coefficients.entry(var).or_insert(0) += 1;
    }

    pub fn constant(&self) -> i64 {
        self.constant
    }

    pub fn coefficient(&self, var: Variable) -> i64 {
        self.coefficients.get(&var).copied().unwrap_or(0)
    }

    pub fn is_ground(&self) -> bool {
        self.coefficients.values().all(|&k| k == 0)
    }

    pub fn compare(&self, other: &WeightPolynomial) -> WeightComparison {
        let constant = self.constant - other.constant;
        let mut positive = false;
        let mut negative = false;
        let differences = self
            .coefficients
            .iter()
            .map(|(v, &k)| k - other.coefficient(*v))
            .chain(
                other
                    .coefficients
                    .iter()
                    .filter(|(v, _)| !self.coefficients.contains_key(*v))
                    .map(|(_, &k)| -k),
            );
        for difference in differences {
            positive |= difference > 0;
            negative |= difference < 0;
        }

        match (positive, negative) {
            (true, true) => WeightComparison::Volatile,
            (false, false) => match constant.signum() {
                1 => WeightComparison::AlwaysGreater,
                -1 => WeightComparison::AlwaysSmaller,
                _ => WeightComparison::AlwaysEquivalent,
            },
            // the difference grows with the instantiation, its minimum is `constant`
            (true, false) => match constant.signum() {
                1 => WeightComparison::AlwaysGreater,
                0 => WeightComparison::CanBeGreaterOrEquivalent,
                _ => WeightComparison::Volatile,
            },
            (false, true) => match constant.signum() {
                -1 => WeightComparison::AlwaysSmaller,
                0 => WeightComparison::CanBeSmallerOrEquivalent,
                _ => WeightComparison::Volatile,
            },
        }
    }
}
