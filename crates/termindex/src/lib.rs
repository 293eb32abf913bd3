//! termindex: the term indexing and ordering core of a first-order
//! saturation prover.
//!
//! - [`logic`]: terms, flatterms, substitution ledgers, unification,
//!   matching, KBO and the literal ordering
//! - [`index`]: the clustered discrimination tree and the feature-vector
//!   index
//! - [`simplifying`]: clause subsumption built on matching and feature vectors

pub mod config;
pub mod error;
pub mod index;
pub mod logic;
pub mod simplifying;

pub use config::{CoreConfig, IndexConfig};
pub use error::{ConfigError, IndexError};

pub use logic::{
    AdmissibleLiteralOrdering, Clause, FlatSymbol, Flatterm, KboConfig, Literal, LiteralOrdering,
    NonrecursiveKbo, Signature, Subterm, Symbol, Term, TermOrdering, Variable,
};

pub use index::{Cluster, ClusteredIndex, FeatureVectorIndex, Retrieval, Subsumed, Subsuming};
pub use simplifying::{subsumes, SubsumptionIndex};
