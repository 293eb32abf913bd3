//! Clauses

use super::literal::Literal;
use super::term::Variable;
use crate::logic::interner::Signature;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A clause (disjunction of literals)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Clause {
    pub literals: Vec<Literal>,
}

impl Clause {
    pub fn new(literals: Vec<Literal>) -> Self {
        Clause { literals }
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn variables(&self) -> IndexSet<Variable> {
        self.literals
            .iter()
            .flat_map(|lit| lit.atom.free_variables())
            .collect()
    }

    pub fn display<'a>(&'a self, signature: &'a Signature) -> ClauseDisplay<'a> {
        ClauseDisplay {
            clause: self,
            signature,
        }
    }
}

pub struct ClauseDisplay<'a> {
    clause: &'a Clause,
    signature: &'a Signature,
}

impl<'a> fmt::Display for ClauseDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clause.literals.is_empty() {
            return write!(f, "$false");
        }
        for (i, lit) in self.clause.literals.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", lit.display(self.signature))?;
        }
        Ok(())
    }
}
