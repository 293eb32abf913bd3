//! Cluster bit sets.
//!
//! Every index entry carries a cluster. Retrieval only reports entries whose
//! cluster equals the query's, and the tree uses set/clear bit tests over
//! clusters to prune subtrees early.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

const WORD_BITS: usize = 64;

/// A finite set of small non-negative integers.
///
/// Words are kept normalized (no trailing zero words), so derived equality
/// and hashing are set equality and set hashing.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cluster {
    words: SmallVec<[u64; 2]>,
}

impl Cluster {
    pub fn new() -> Self {
        Cluster::default()
    }

    pub fn singleton(bit: usize) -> Self {
        let mut cluster = Cluster::new();
        cluster.insert(bit);
        cluster
    }

    pub fn insert(&mut self, bit: usize) {
        let word = bit / WORD_BITS;
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1 << (bit % WORD_BITS);
    }

    pub fn remove(&mut self, bit: usize) {
        if let Some(word) = self.words.get_mut(bit / WORD_BITS) {
            *word &= !(1 << (bit % WORD_BITS));
            self.normalize();
        }
    }

    pub fn contains(&self, bit: usize) -> bool {
        self.words
            .get(bit / WORD_BITS)
            .is_some_and(|w| w & (1 << (bit % WORD_BITS)) != 0)
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Is every bit of `other` also in `self`?
    pub fn contains_all(&self, other: &Cluster) -> bool {
        other.words.len() <= self.words.len()
            && other
                .words
                .iter()
                .zip(&self.words)
                .all(|(o, s)| o & !s == 0)
    }

    pub fn is_disjoint(&self, other: &Cluster) -> bool {
        self.words.iter().zip(&other.words).all(|(a, b)| a & b == 0)
    }

    pub fn union(&self, other: &Cluster) -> Cluster {
        let (long, short) = if self.words.len() >= other.words.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut words = long.words.clone();
        for (w, s) in words.iter_mut().zip(&short.words) {
            *w |= s;
        }
        Cluster { words }
    }

    pub fn intersection(&self, other: &Cluster) -> Cluster {
        let words = self
            .words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| a & b)
            .collect();
        let mut cluster = Cluster { words };
        cluster.normalize();
        cluster
    }

    /// Bits of `self` that are not in `other`
    pub fn difference(&self, other: &Cluster) -> Cluster {
        let mut words = self.words.clone();
        for (w, o) in words.iter_mut().zip(&other.words) {
            *w &= !o;
        }
        let mut cluster = Cluster { words };
        cluster.normalize();
        cluster
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            (0..WORD_BITS)
                .filter(move |b| word & (1 << b) != 0)
                .map(move |b| i * WORD_BITS + b)
        })
    }

    fn normalize(&mut self) {
        while self.words.last() == Some(&0) {
            self.words.pop();
        }
    }
}

impl FromIterator<usize> for Cluster {
    fn from_iter<I: IntoIterator<Item = usize>>(bits: I) -> Self {
        let mut cluster = Cluster::new();
        for bit in bits {
            cluster.insert(bit);
        }
        cluster
    }
}

impl fmt::Debug for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
