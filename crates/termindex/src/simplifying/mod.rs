//! Redundancy checks built on the indexes

pub mod subsumption;

pub use subsumption::{subsumes, SubsumptionIndex};
