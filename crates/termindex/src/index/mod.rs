//! Term and clause indexing
//!
//! - [`clustered`]: discrimination tree keyed by (term, cluster), retrieving
//!   unifiable entries
//! - [`feature_vector`]: trie over feature vectors for subsumption filtering

pub mod cluster;
pub mod clustered;
pub mod feature_vector;

pub use cluster::Cluster;
pub use clustered::{ClusteredIndex, Retrieval};
pub use feature_vector::{FeatureExtractor, FeatureVectorIndex, Subsumed, Subsuming};
