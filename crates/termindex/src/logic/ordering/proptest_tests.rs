//! Property-based tests for KBO and the literal ordering.

use super::literal::{compare_equality_atoms, compare_negative_with_positive_equality};
use super::{AdmissibleLiteralOrdering, LiteralOrdering, NonrecursiveKbo, TermOrdering, WeightComparison};
use crate::logic::arbitrary::{arb_ground_term_desc, arb_term_desc, TermBuilder, TermDesc};
use crate::logic::core::literal::Literal;
use crate::logic::core::term::Term;
use crate::logic::flatterm::Subterm;
use crate::logic::unification::TermSubstitution;
use proptest::prelude::*;

fn arb_triple(
    strategy: fn(u32) -> BoxedStrategy<TermDesc>,
    max_depth: u32,
) -> impl Strategy<Value = (TermDesc, TermDesc, TermDesc)> {
    (strategy(max_depth), strategy(max_depth), strategy(max_depth))
}

proptest! {
    /// Transitivity on ground terms: if a > b and b > c, then a > c
    #[test]
    fn kbo_transitivity((d1, d2, d3) in arb_triple(arb_ground_term_desc, 3)) {
        let mut b = TermBuilder::new();
        let (t1, t2, t3) = (b.build(&d1), b.build(&d2), b.build(&d3));
        let kbo = NonrecursiveKbo::default();
        let cmp12 = kbo.compare(&t1, &t2);
        let cmp23 = kbo.compare(&t2, &t3);
        let cmp13 = kbo.compare(&t1, &t3);
        if cmp12 == TermOrdering::Greater && cmp23 == TermOrdering::Greater {
            prop_assert_eq!(cmp13, TermOrdering::Greater);
        }
        if cmp12 == TermOrdering::Smaller && cmp23 == TermOrdering::Smaller {
            prop_assert_eq!(cmp13, TermOrdering::Smaller);
        }
    }

    /// Ground terms are always comparable, and equivalent only when equal
    #[test]
    fn kbo_total_on_ground_terms((d1, d2, _d3) in arb_triple(arb_ground_term_desc, 3)) {
        let mut b = TermBuilder::new();
        let (t1, t2) = (b.build(&d1), b.build(&d2));
        let cmp = NonrecursiveKbo::default().compare(&t1, &t2);
        prop_assert_ne!(cmp, TermOrdering::Incomparable);
        prop_assert_eq!(cmp == TermOrdering::Equivalent, t1 == t2);
    }

    /// compare(a, b) is the flip of compare(b, a)
    #[test]
    fn kbo_flip_symmetry((d1, d2, _d3) in arb_triple(arb_term_desc, 3)) {
        let mut b = TermBuilder::new();
        let (t1, t2) = (b.build(&d1), b.build(&d2));
        let kbo = NonrecursiveKbo::default();
        prop_assert_eq!(kbo.compare(&t1, &t2), kbo.compare(&t2, &t1).flip());
    }

    /// Reflexivity: t is equivalent to itself
    #[test]
    fn kbo_reflexivity(d in arb_term_desc(3)) {
        let mut b = TermBuilder::new();
        let t = b.build(&d);
        prop_assert_eq!(NonrecursiveKbo::default().compare(&t, &t), TermOrdering::Equivalent);
    }

    /// Tree and flatterm overloads agree
    #[test]
    fn kbo_flat_overload_agrees((d1, d2, _d3) in arb_triple(arb_term_desc, 3)) {
        let mut b = TermBuilder::new();
        let (t1, t2) = (b.build(&d1), b.build(&d2));
        let kbo = NonrecursiveKbo::default();
        prop_assert_eq!(
            kbo.compare(&t1, &t2),
            kbo.compare_flat(&Subterm::from_term(&t1), &Subterm::from_term(&t2))
        );
    }

    /// Comparing modulo a substitution is comparing the instances
    #[test]
    fn kbo_modulo_matches_applied((d1, d2, d3) in arb_triple(arb_term_desc, 2)) {
        let mut b = TermBuilder::new();
        let (t1, t2) = (b.build(&d1), b.build(&d2));
        let instance = b.build_in(&d3, 1);
        let mut subst = TermSubstitution::new();
        subst.bind(b.banks[0].get(0), instance);
        let kbo = NonrecursiveKbo::default();
        prop_assert_eq!(
            kbo.compare_modulo(&t1, &t2, &subst),
            kbo.compare(&subst.apply(&t1), &subst.apply(&t2))
        );
    }

    /// Greater is stable under instantiation
    #[test]
    fn kbo_stable_under_substitution((d1, d2, d3) in arb_triple(arb_term_desc, 2)) {
        let mut b = TermBuilder::new();
        let (t1, t2) = (b.build(&d1), b.build(&d2));
        let ground = b.build(&strip_variables(&d3));
        let kbo = NonrecursiveKbo::default();
        if kbo.compare(&t1, &t2) == TermOrdering::Greater {
            let mut subst = TermSubstitution::new();
            for i in 0..4 {
                subst.bind(b.banks[0].get(i), ground.clone());
            }
            prop_assert_eq!(
                kbo.compare(&subst.apply(&t1), &subst.apply(&t2)),
                TermOrdering::Greater
            );
            prop_assert!(kbo.can_be_greater(&t1, &t2));
        }
    }
}

fn strip_variables(desc: &TermDesc) -> TermDesc {
    match desc {
        TermDesc::Var(i) => TermDesc::Const(*i),
        TermDesc::Const(i) => TermDesc::Const(*i),
        TermDesc::Func(f, args) => TermDesc::Func(*f, args.iter().map(strip_variables).collect()),
    }
}

// =========================================================================
// Equality literal case trees
// =========================================================================

/// A random strict order on 0..N: an edge i < j can only point upwards, so
/// the relation is acyclic (and deliberately not transitively closed).
const N: usize = 5;

fn arb_relation() -> impl Strategy<Value = Vec<bool>> {
    proptest::collection::vec(any::<bool>(), N * N)
}

fn relation_cmp(less: &[bool]) -> impl Fn(&usize, &usize) -> TermOrdering + '_ {
    move |x: &usize, y: &usize| {
        let (x, y) = (*x, *y);
        if x == y {
            TermOrdering::Equivalent
        } else if x < y && less[x * N + y] {
            TermOrdering::Smaller
        } else if y < x && less[y * N + x] {
            TermOrdering::Greater
        } else {
            TermOrdering::Incomparable
        }
    }
}

/// Multiset extension by definition: drop equal pairs, then M > N when every
/// remaining element of N is dominated by a remaining element of M.
fn multiset_reference<T: Clone>(
    m: &[T],
    n: &[T],
    cmp: &impl Fn(&T, &T) -> TermOrdering,
) -> TermOrdering {
    let mut m: Vec<T> = m.to_vec();
    let mut n: Vec<T> = n.to_vec();
    let mut i = 0;
    while i < m.len() {
        match n.iter().position(|y| cmp(&m[i], y) == TermOrdering::Equivalent) {
            Some(j) => {
                m.remove(i);
                n.remove(j);
            }
            None => i += 1,
        }
    }
    let dominates = |big: &[T], small: &[T], wanted: TermOrdering| {
        !big.is_empty() && small.iter().all(|y| big.iter().any(|x| cmp(x, y) == wanted))
    };
    match (m.is_empty(), n.is_empty()) {
        (true, true) => TermOrdering::Equivalent,
        _ if dominates(&m, &n, TermOrdering::Greater) => TermOrdering::Greater,
        _ if dominates(&n, &m, TermOrdering::Greater) => TermOrdering::Smaller,
        _ => TermOrdering::Incomparable,
    }
}

proptest! {
    /// The positive/positive tree is the multiset extension on {s1, s2} vs {t1, t2}
    #[test]
    fn equality_atoms_match_multiset_extension(less in arb_relation()) {
        let cmp = relation_cmp(&less);
        for s1 in 0..N { for s2 in 0..N { for t1 in 0..N { for t2 in 0..N {
            let fast = compare_equality_atoms(&s1, &s2, &t1, &t2, &cmp);
            let slow = multiset_reference(&[s1, s2], &[t1, t2], &cmp);
            prop_assert_eq!(fast, slow, "{:?}", (s1, s2, t1, t2));
        }}}}
    }

    /// The negative/positive tree is the multiset extension on
    /// {s1, s1, s2, s2} vs {t1, t2}
    #[test]
    fn negative_positive_match_multiset_extension(less in arb_relation()) {
        let cmp = relation_cmp(&less);
        for s1 in 0..N { for s2 in 0..N { for t1 in 0..N { for t2 in 0..N {
            let fast = compare_negative_with_positive_equality(&s1, &s2, &t1, &t2, &cmp);
            let slow = multiset_reference(&[s1, s1, s2, s2], &[t1, t2], &cmp);
            prop_assert_eq!(fast, slow, "{:?}", (s1, s2, t1, t2));
            prop_assert_ne!(fast, TermOrdering::Equivalent);
        }}}}
    }
}

// =========================================================================
// Weights, non-ground chains and whole literals
// =========================================================================

proptest! {
    /// A KBO decision never contradicts the weight comparison
    #[test]
    fn kbo_respects_weight_comparison((d1, d2, _d3) in arb_triple(arb_term_desc, 3)) {
        let mut b = TermBuilder::new();
        let (t1, t2) = (b.build(&d1), b.build(&d2));
        let kbo = NonrecursiveKbo::default();
        let weights = kbo.weight(&t1).compare(&kbo.weight(&t2));
        match kbo.compare(&t1, &t2) {
            TermOrdering::Smaller => prop_assert!(
                !matches!(
                    weights,
                    WeightComparison::AlwaysGreater | WeightComparison::CanBeGreaterOrEquivalent
                ),
                "{:?}", weights
            ),
            TermOrdering::Greater => prop_assert!(
                !matches!(
                    weights,
                    WeightComparison::AlwaysSmaller | WeightComparison::CanBeSmallerOrEquivalent
                ),
                "{:?}", weights
            ),
            _ => {}
        }
    }

    /// Transitivity with variables: a < b and b < c rule out c <= a
    #[test]
    fn kbo_transitivity_with_variables((d1, d2, d3) in arb_triple(arb_term_desc, 3)) {
        let mut b = TermBuilder::new();
        let (t1, t2, t3) = (b.build(&d1), b.build(&d2), b.build(&d3));
        let kbo = NonrecursiveKbo::default();
        if kbo.compare(&t1, &t2) == TermOrdering::Smaller
            && kbo.compare(&t2, &t3) == TermOrdering::Smaller
        {
            let cmp13 = kbo.compare(&t1, &t3);
            prop_assert!(
                cmp13 != TermOrdering::Greater && cmp13 != TermOrdering::Equivalent,
                "{:?}", cmp13
            );
        }
    }

    /// Equality literals compare as the multiset extension of KBO, with a
    /// negative equation s != t counted as {s, s, t, t}
    #[test]
    fn equality_literals_match_multiset_extension(
        (d1, d2, d3, d4) in (arb_term_desc(2), arb_term_desc(2), arb_term_desc(2), arb_term_desc(2)),
        a_positive in any::<bool>(),
        b_positive in any::<bool>(),
    ) {
        let mut b = TermBuilder::new();
        let (s1, s2) = (b.build(&d1), b.build(&d2));
        let (t1, t2) = (b.build(&d3), b.build(&d4));
        let literal = |positive: bool, atom: Term| {
            if positive { Literal::positive(atom) } else { Literal::negative(atom) }
        };
        let a = literal(a_positive, Term::equality(s1.clone(), s2.clone()));
        let c = literal(b_positive, Term::equality(t1.clone(), t2.clone()));

        let ordering = AdmissibleLiteralOrdering::default();
        let kbo = ordering.kbo();
        let cmp = |x: &Term, y: &Term| kbo.compare(x, y);
        let expected = match (a_positive, b_positive) {
            (false, true) => multiset_reference(
                &[s1.clone(), s1.clone(), s2.clone(), s2.clone()],
                &[t1.clone(), t2.clone()],
                &cmp,
            ),
            (true, false) => multiset_reference(
                &[s1.clone(), s2.clone()],
                &[t1.clone(), t1.clone(), t2.clone(), t2.clone()],
                &cmp,
            ),
            _ => multiset_reference(&[s1.clone(), s2.clone()], &[t1.clone(), t2.clone()], &cmp),
        };
        prop_assert_eq!(ordering.compare(&a, &c), expected, "{:?}", (&a, &c));

        let p = b.sig.intern_predicate("p", 1);
        let non_equality = literal(b_positive, Term::atom(p, vec![t1]));
        prop_assert_eq!(ordering.compare(&a, &non_equality), TermOrdering::Smaller);
        prop_assert_eq!(ordering.compare(&non_equality, &a), TermOrdering::Greater);
    }
}
