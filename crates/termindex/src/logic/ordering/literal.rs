//! Literal orderings
//!
//! [`AdmissibleLiteralOrdering`] extends KBO to literals. Equality literals
//! are compared as multisets of their argument terms: `s = t` as `{s, t}`
//! and `s != t` as `{s, s, t, t}`. Instead of building those multisets the
//! comparison runs a fixed decision tree over at most four term comparisons.

use super::kbo::{NonrecursiveKbo, TermOrdering};
use crate::logic::core::literal::{FlatLiteral, Literal};
use crate::logic::core::term::Term;
use crate::logic::flatterm::{FlatSymbol, Subterm};

/// A total-on-the-comparable-part ordering of literals
pub trait LiteralOrdering {
    fn compare(&self, a: &Literal, b: &Literal) -> TermOrdering;
}

/// Indices of the literals that no other literal is strictly greater than
pub fn maximal_literals(ordering: &impl LiteralOrdering, literals: &[Literal]) -> Vec<usize> {
    (0..literals.len())
        .filter(|&i| {
            literals.iter().enumerate().all(|(j, other)| {
                i == j || ordering.compare(&literals[i], other) != TermOrdering::Smaller
            })
        })
        .collect()
}

/// Multiset comparison of `{s1, s2}` against `{t1, t2}`.
///
/// `cmp` must be irreflexive and acyclic on the terms involved.
pub fn compare_equality_atoms<T>(
    s1: &T,
    s2: &T,
    t1: &T,
    t2: &T,
    mut cmp: impl FnMut(&T, &T) -> TermOrdering,
) -> TermOrdering {
    use TermOrdering::*;
    let a = cmp(s1, t1);
    match a {
        Equivalent => cmp(s2, t2),
        Greater => match cmp(s1, t2) {
            Equivalent => cmp(s2, t1),
            Greater => Greater,
            Smaller => match cmp(s2, t2) {
                Equivalent | Greater => Greater,
                Smaller => Smaller,
                Incomparable => match cmp(s2, t1) {
                    Equivalent | Smaller => Smaller,
                    _ => Incomparable,
                },
            },
            Incomparable => match cmp(s2, t2) {
                Equivalent => Greater,
                Greater => match cmp(s2, t1) {
                    Equivalent => Incomparable,
                    _ => Greater,
                },
                _ => Incomparable,
            },
        },
        Smaller => match cmp(s2, t1) {
            Equivalent => cmp(s1, t2),
            Smaller => Smaller,
            Greater => match cmp(s2, t2) {
                Equivalent | Smaller => Smaller,
                Greater => Greater,
                Incomparable => match cmp(s1, t2) {
                    Equivalent | Greater => Greater,
                    _ => Incomparable,
                },
            },
            Incomparable => match cmp(s2, t2) {
                Equivalent => Smaller,
                Smaller => match cmp(s1, t2) {
                    Equivalent => Incomparable,
                    _ => Smaller,
                },
                _ => Incomparable,
            },
        },
        Incomparable => match cmp(s1, t2) {
            Equivalent => cmp(s2, t1),
            Greater => match cmp(s2, t1) {
                Equivalent => Greater,
                Greater => match cmp(s2, t2) {
                    Equivalent => Incomparable,
                    _ => Greater,
                },
                _ => Incomparable,
            },
            Smaller => match cmp(s2, t2) {
                Equivalent => Incomparable,
                Greater => match cmp(s2, t1) {
                    Equivalent | Smaller => Smaller,
                    Greater => Greater,
                    Incomparable => Incomparable,
                },
                Smaller => Smaller,
                Incomparable => match cmp(s2, t1) {
                    Equivalent | Smaller => Smaller,
                    _ => Incomparable,
                },
            },
            Incomparable => match cmp(s2, t1) {
                Greater => match cmp(s2, t2) {
                    Greater => Greater,
                    _ => Incomparable,
                },
                _ => Incomparable,
            },
        },
    }
}

/// Multiset comparison of `{s1, s1, s2, s2}` (a negative equality) against
/// `{t1, t2}` (a positive one). Never Equivalent.
pub fn compare_negative_with_positive_equality<T>(
    s1: &T,
    s2: &T,
    t1: &T,
    t2: &T,
    mut cmp: impl FnMut(&T, &T) -> TermOrdering,
) -> TermOrdering {
    use TermOrdering::*;
    // t2 is the only term of the positive side left to dominate
    let settle_t2 = |c: TermOrdering, e: TermOrdering| match (c, e) {
        (Equivalent | Greater, _) | (_, Equivalent | Greater) => Greater,
        (Smaller, Smaller) => Smaller,
        _ => Incomparable,
    };
    match cmp(s1, t1) {
        Equivalent => {
            let c = cmp(s1, t2);
            match c {
                Equivalent | Greater => Greater,
                _ => settle_t2(c, cmp(s2, t2)),
            }
        }
        Greater => match cmp(s1, t2) {
            Equivalent | Greater => Greater,
            Smaller => match cmp(s2, t2) {
                Equivalent | Greater => Greater,
                Smaller => Smaller,
                Incomparable => match cmp(s2, t1) {
                    Smaller => Smaller,
                    _ => Incomparable,
                },
            },
            Incomparable => match cmp(s2, t2) {
                Equivalent | Greater => Greater,
                _ => Incomparable,
            },
        },
        Smaller => match cmp(s2, t1) {
            Equivalent => {
                let e = cmp(s2, t2);
                match e {
                    Equivalent | Greater => Greater,
                    _ => settle_t2(cmp(s1, t2), e),
                }
            }
            Greater => match cmp(s2, t2) {
                Equivalent | Greater => Greater,
                Smaller => Smaller,
                Incomparable => match cmp(s1, t2) {
                    Equivalent | Greater => Greater,
                    _ => Incomparable,
                },
            },
            Smaller => Smaller,
            Incomparable => match cmp(s2, t2) {
                Smaller => match cmp(s1, t2) {
                    Equivalent => Incomparable,
                    _ => Smaller,
                },
                _ => Incomparable,
            },
        },
        Incomparable => match cmp(s2, t1) {
            Equivalent => {
                let c = cmp(s1, t2);
                match c {
                    Equivalent | Greater => Greater,
                    _ => settle_t2(c, cmp(s2, t2)),
                }
            }
            Greater => {
                let e = cmp(s2, t2);
                match e {
                    Equivalent | Greater => Greater,
                    _ => settle_t2(cmp(s1, t2), e),
                }
            }
            d => match cmp(s1, t2) {
                Smaller => match (d, cmp(s2, t2)) {
                    (_, Equivalent) => Incomparable,
                    (Smaller, _) | (_, Smaller) => Smaller,
                    _ => Incomparable,
                },
                _ => Incomparable,
            },
        },
    }
}

/// Admissible literal ordering on top of KBO
#[derive(Debug, Clone, Default)]
pub struct AdmissibleLiteralOrdering {
    kbo: NonrecursiveKbo,
}

impl AdmissibleLiteralOrdering {
    pub fn new(kbo: NonrecursiveKbo) -> Self {
        AdmissibleLiteralOrdering { kbo }
    }

    pub fn kbo(&self) -> &NonrecursiveKbo {
        &self.kbo
    }

    /// The flatterm overload; agrees with [`LiteralOrdering::compare`]
    pub fn compare_flat(&self, a: &FlatLiteral, b: &FlatLiteral) -> TermOrdering {
        let cmp = |x: &Subterm, y: &Subterm| self.kbo.compare_flat(x, y);
        match (a.is_equality(), b.is_equality()) {
            (true, false) => TermOrdering::Smaller,
            (false, true) => TermOrdering::Greater,
            (false, false) => break_tie(cmp(&a.atom, &b.atom), a.polarity, b.polarity),
            (true, true) => {
                let (s1, s2) = (a.atom.arg(0), a.atom.arg(1));
                let (t1, t2) = (b.atom.arg(0), b.atom.arg(1));
                compare_equalities(a.polarity, b.polarity, [&s1, &s2, &t1, &t2], cmp)
            }
        }
    }
}

impl LiteralOrdering for AdmissibleLiteralOrdering {
    fn compare(&self, a: &Literal, b: &Literal) -> TermOrdering {
        let cmp = |x: &Term, y: &Term| self.kbo.compare(x, y);
        match (a.is_equality(), b.is_equality()) {
            (true, false) => TermOrdering::Smaller,
            (false, true) => TermOrdering::Greater,
            (false, false) => break_tie(cmp(&a.atom, &b.atom), a.polarity, b.polarity),
            (true, true) => {
                let (s, t) = (a.args(), b.args());
                compare_equalities(a.polarity, b.polarity, [&s[0], &s[1], &t[0], &t[1]], cmp)
            }
        }
    }
}

/// Equal atoms: the positive literal is the smaller one
fn break_tie(atoms: TermOrdering, a_positive: bool, b_positive: bool) -> TermOrdering {
    match (atoms, a_positive, b_positive) {
        (TermOrdering::Equivalent, true, false) => TermOrdering::Smaller,
        (TermOrdering::Equivalent, false, true) => TermOrdering::Greater,
        (atoms, _, _) => atoms,
    }
}

fn compare_equalities<T>(
    a_positive: bool,
    b_positive: bool,
    [s1, s2, t1, t2]: [&T; 4],
    cmp: impl FnMut(&T, &T) -> TermOrdering,
) -> TermOrdering {
    match (a_positive, b_positive) {
        (true, true) | (false, false) => compare_equality_atoms(s1, s2, t1, t2, cmp),
        (false, true) => compare_negative_with_positive_equality(s1, s2, t1, t2, cmp),
        (true, false) => compare_negative_with_positive_equality(t1, t2, s1, s2, cmp).flip(),
    }
}

/// Orders literals by shallow weight: the predicate's weight plus, for every
/// argument, the weight of its top symbol (variables count the variable
/// weight). Ties go to the predicate with the larger id, then Equivalent.
#[derive(Debug, Clone, Default)]
pub struct ShallowWeightOrdering {
    kbo: NonrecursiveKbo,
}

impl ShallowWeightOrdering {
    pub fn new(kbo: NonrecursiveKbo) -> Self {
        ShallowWeightOrdering { kbo }
    }

    pub fn shallow_weight(&self, literal: &Literal) -> i64 {
        let head = self.kbo.symbol_weight(literal.predicate());
        literal.args().iter().fold(head, |total, arg| {
            total
                + match arg.head() {
                    FlatSymbol::Symbol(s) => self.kbo.symbol_weight(s),
                    FlatSymbol::Variable(_) => self.kbo.variable_weight(),
                    FlatSymbol::Abstraction(_) => 1,
                }
        })
    }
}

impl LiteralOrdering for ShallowWeightOrdering {
    fn compare(&self, a: &Literal, b: &Literal) -> TermOrdering {
        let by_weight = self.shallow_weight(a).cmp(&self.shallow_weight(b));
        match by_weight.then_with(|| a.predicate().id.cmp(&b.predicate().id)) {
            std::cmp::Ordering::Greater => TermOrdering::Greater,
            std::cmp::Ordering::Less => TermOrdering::Smaller,
            std::cmp::Ordering::Equal => TermOrdering::Equivalent,
        }
    }
}
