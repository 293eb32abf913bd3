//! Core term, literal and clause types

pub mod clause;
pub mod literal;
pub mod term;
