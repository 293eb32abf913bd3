//! Property-based tests for the clustered index using proptest.

use super::ClusteredIndex;
use crate::config::IndexConfig;
use crate::index::cluster::Cluster;
use crate::logic::arbitrary::{arb_term_desc, TermBuilder, TermDesc};
use crate::logic::flatterm::Subterm;
use crate::logic::unification::{unify, UnifierSubstitution};
use proptest::prelude::*;

fn cluster_of(bits: u8) -> Cluster {
    (0..3).filter(|b| bits & (1 << b) != 0).collect()
}

fn arb_entries() -> impl Strategy<Value = Vec<(TermDesc, u8)>> {
    proptest::collection::vec((arb_term_desc(3), 0..4u8), 0..14)
}

/// Keys `f0(l, r)` whose sides wrap a few shared stems in unary `f1`, so
/// that many keys share nested prefixes and some repeat a side
fn arb_shared_prefix_entries() -> impl Strategy<Value = Vec<(TermDesc, u8)>> {
    proptest::collection::vec(arb_term_desc(2), 1..4).prop_flat_map(|stems| {
        let n = stems.len();
        proptest::collection::vec((0..n, 0..n, 0..3usize, 0..2u8), 1..12).prop_map(
            move |picks| {
                picks
                    .into_iter()
                    .map(|(i, j, wraps, bits)| {
                        let mut left = stems[i].clone();
                        for _ in 0..wraps {
                            left = TermDesc::Func(1, vec![left]);
                        }
                        let right = if wraps % 2 == 0 {
                            left.clone()
                        } else {
                            stems[j].clone()
                        };
                        (TermDesc::Func(0, vec![left, right]), bits)
                    })
                    .collect()
            },
        )
    })
}

struct Fixture {
    index: ClusteredIndex<usize>,
    keys: Vec<(Subterm, Cluster)>,
    builder: TermBuilder,
}

/// Index variables from bank 0, query variables from bank 1
fn build(entries: &[(TermDesc, u8)], buckets: usize) -> Fixture {
    let mut builder = TermBuilder::new();
    let mut index = ClusteredIndex::new(&IndexConfig {
        hash_table_size: buckets,
    });
    let mut keys = Vec::new();
    for (i, (desc, bits)) in entries.iter().enumerate() {
        let term = Subterm::from_term(&builder.build(desc));
        index.insert(&term, cluster_of(*bits), i);
        keys.push((term, cluster_of(*bits)));
    }
    Fixture {
        index,
        keys,
        builder,
    }
}

fn brute_force(keys: &[(Subterm, Cluster)], query: &Subterm, cluster: &Cluster) -> Vec<usize> {
    keys.iter()
        .enumerate()
        .filter(|(_, (term, c))| {
            c == cluster && unify(term, query, &mut UnifierSubstitution::new())
        })
        .map(|(i, _)| i)
        .collect()
}

fn retrieve(
    index: &ClusteredIndex<usize>,
    keys: &[(Subterm, Cluster)],
    query: &Subterm,
    cluster: &Cluster,
) -> Result<Vec<usize>, TestCaseError> {
    let mut subst = UnifierSubstitution::new();
    let mut retrieval = index.retrieval();
    retrieval.reset_query(query, cluster, &mut subst);
    let mut found = Vec::new();
    while let Some(&i) = retrieval.retrieve_next(&mut subst) {
        // the ledger holds a unifier of the entry and the query
        prop_assert_eq!(subst.apply(&keys[i].0), subst.apply(query));
        found.push(i);
    }
    retrieval.finish(&mut subst);
    prop_assert!(subst.is_empty(), "finish must restore the ledger");
    found.sort_unstable();
    Ok(found)
}

proptest! {
    /// Retrieval returns exactly the entries of the query cluster whose key
    /// unifies with the query
    #[test]
    fn retrieval_matches_brute_force(
        entries in arb_entries(),
        query in arb_term_desc(2),
        bits in 0..4u8,
        buckets in 1..5usize,
    ) {
        let mut fx = build(&entries, buckets);
        fx.index.check_invariants();
        let query = Subterm::from_term(&fx.builder.build_in(&query, 1));
        let cluster = cluster_of(bits);
        let found = retrieve(&fx.index, &fx.keys, &query, &cluster)?;
        prop_assert_eq!(found, brute_force(&fx.keys, &query, &cluster));
        prop_assert_eq!(fx.index.open_retrievals(), 0);
    }

    /// Two interleaved cursors with their own ledgers do not disturb
    /// each other
    #[test]
    fn interleaved_retrievals_are_independent(
        entries in arb_entries(),
        q1 in arb_term_desc(2),
        q2 in arb_term_desc(2),
        bits in 0..4u8,
    ) {
        let mut fx = build(&entries, 4);
        let q1 = Subterm::from_term(&fx.builder.build_in(&q1, 1));
        let q2 = Subterm::from_term(&fx.builder.build_in(&q2, 1));
        let cluster = cluster_of(bits);

        let (mut s1, mut s2) = (UnifierSubstitution::new(), UnifierSubstitution::new());
        let mut r1 = fx.index.retrieval();
        let mut r2 = fx.index.retrieval();
        r1.reset_query(&q1, &cluster, &mut s1);
        r2.reset_query(&q2, &cluster, &mut s2);
        prop_assert_eq!(fx.index.open_retrievals(), 2);

        let (mut found1, mut found2) = (Vec::new(), Vec::new());
        let (mut done1, mut done2) = (false, false);
        while !(done1 && done2) {
            if !done1 {
                match r1.retrieve_next(&mut s1) {
                    Some(&i) => found1.push(i),
                    None => done1 = true,
                }
            }
            if !done2 {
                match r2.retrieve_next(&mut s2) {
                    Some(&i) => found2.push(i),
                    None => done2 = true,
                }
            }
        }
        r1.finish(&mut s1);
        r2.finish(&mut s2);
        prop_assert!(s1.is_empty() && s2.is_empty());
        found1.sort_unstable();
        found2.sort_unstable();
        prop_assert_eq!(found1, brute_force(&fx.keys, &q1, &cluster));
        prop_assert_eq!(found2, brute_force(&fx.keys, &q2, &cluster));
    }

    /// count/erase/relocate move exactly the reported number of entries and
    /// keep the tree canonical
    #[test]
    fn erase_relocate_bookkeeping(
        entries in arb_entries(),
        picks in proptest::collection::vec((any::<prop::sample::Index>(), 0..4u8, any::<bool>()), 1..8),
    ) {
        prop_assume!(!entries.is_empty());
        let mut fx = build(&entries, 3);
        // erased entries move to a cluster no query uses
        let erased = Cluster::singleton(7);
        for (pick, bits, relocate) in picks {
            let (term, cluster) = fx.keys[pick.index(fx.keys.len())].clone();
            if cluster == erased {
                continue;
            }
            let before = fx.index.count(&term, &cluster);
            let len = fx.index.len();
            if relocate {
                let target = cluster_of(bits);
                let target_before = fx.index.count(&term, &target);
                let moved = fx.index.relocate(&term, &cluster, target.clone(), |&i| i % 2 == 0);
                if target != cluster {
                    prop_assert_eq!(fx.index.count(&term, &cluster), before - moved);
                    prop_assert_eq!(fx.index.count(&term, &target), target_before + moved);
                } else {
                    prop_assert_eq!(fx.index.count(&term, &cluster), before);
                }
                prop_assert_eq!(fx.index.len(), len);
                for (i, key) in fx.keys.iter_mut().enumerate() {
                    if i % 2 == 0 && key.0 == term && key.1 == cluster {
                        key.1 = target.clone();
                    }
                }
            } else {
                let removed = fx.index.erase(&term, &cluster, |&i| i % 3 == 0);
                prop_assert_eq!(fx.index.count(&term, &cluster), before - removed);
                prop_assert_eq!(fx.index.len(), len - removed);
                for (i, key) in fx.keys.iter_mut().enumerate() {
                    if i % 3 == 0 && key.0 == term && key.1 == cluster {
                        key.1 = erased.clone();
                    }
                }
            }
            fx.index.check_invariants();
        }

        // retrieval still agrees with the surviving entries
        for (desc, _) in &entries {
            let query = Subterm::from_term(&fx.builder.build_in(desc, 1));
            for bits in 0..4u8 {
                let cluster = cluster_of(bits);
                let found = retrieve(&fx.index, &fx.keys, &query, &cluster)?;
                prop_assert_eq!(found, brute_force(&fx.keys, &query, &cluster));
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// A query variable repeated across arguments is bound by the first tree
    /// path and checked against the second, across backtracking
    #[test]
    fn repeated_query_variable_matches_brute_force(
        entries in arb_shared_prefix_entries(),
        shape in 0..3u8,
        bits in 0..2u8,
    ) {
        let mut fx = build(&entries, 2);
        let z = TermDesc::Var(0);
        let query = match shape {
            0 => TermDesc::Func(0, vec![z.clone(), z.clone()]),
            1 => TermDesc::Func(0, vec![TermDesc::Func(1, vec![z.clone()]), z.clone()]),
            _ => TermDesc::Func(0, vec![z.clone(), TermDesc::Func(1, vec![z])]),
        };
        let query = Subterm::from_term(&fx.builder.build_in(&query, 1));
        let cluster = cluster_of(bits);
        let found = retrieve(&fx.index, &fx.keys, &query, &cluster)?;
        prop_assert_eq!(found, brute_force(&fx.keys, &query, &cluster));
    }
}
