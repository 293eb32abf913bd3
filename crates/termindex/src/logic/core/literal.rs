//! Literals

use super::term::{Symbol, Term};
use crate::logic::flatterm::{FlatSymbol, Subterm};
use crate::logic::interner::Signature;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A literal: an atom with a polarity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub atom: Term,
    pub polarity: bool, // true = positive, false = negative
}

impl Literal {
    pub fn positive(atom: Term) -> Self {
        debug_assert!(matches!(atom, Term::Atom(..)));
        Literal {
            atom,
            polarity: true,
        }
    }

    pub fn negative(atom: Term) -> Self {
        debug_assert!(matches!(atom, Term::Atom(..)));
        Literal {
            atom,
            polarity: false,
        }
    }

    /// The predicate symbol of the atom
    pub fn predicate(&self) -> Symbol {
        match &self.atom {
            Term::Atom(p, _) => *p,
            other => panic!("literal over a non-atom: {:?}", other.head()),
        }
    }

    pub fn args(&self) -> &[Term] {
        self.atom.args()
    }

    /// Equality literals are recognised by the reserved predicate id
    pub fn is_equality(&self) -> bool {
        self.predicate().is_equality()
    }

    pub fn complement(&self) -> Literal {
        Literal {
            atom: self.atom.clone(),
            polarity: !self.polarity,
        }
    }

    pub fn display<'a>(&'a self, signature: &'a Signature) -> LiteralDisplay<'a> {
        LiteralDisplay {
            literal: self,
            signature,
        }
    }
}

/// A literal whose atom is stored as a flatterm subterm.
#[derive(Debug, Clone)]
pub struct FlatLiteral {
    pub atom: Subterm,
    pub polarity: bool,
}

impl FlatLiteral {
    pub fn new(atom: Subterm, polarity: bool) -> Self {
        FlatLiteral { atom, polarity }
    }

    pub fn from_literal(literal: &Literal) -> Self {
        FlatLiteral {
            atom: Subterm::from_term(&literal.atom),
            polarity: literal.polarity,
        }
    }

    pub fn is_equality(&self) -> bool {
        matches!(self.atom.symbol(), FlatSymbol::Symbol(s) if s.is_equality())
    }
}

/// Display wrapper for Literal resolving names through a signature
pub struct LiteralDisplay<'a> {
    literal: &'a Literal,
    signature: &'a Signature,
}

impl<'a> fmt::Display for LiteralDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let atom = self.literal.atom.display(self.signature);
        match (self.literal.polarity, self.literal.is_equality()) {
            (true, _) => write!(f, "{}", atom),
            (false, true) => {
                let args = self.literal.args();
                write!(
                    f,
                    "{} != {}",
                    args[0].display(self.signature),
                    args[1].display(self.signature)
                )
            }
            (false, false) => write!(f, "~{}", atom),
        }
    }
}
