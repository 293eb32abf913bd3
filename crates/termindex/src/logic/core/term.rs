//! Tree-shaped terms and formulas

use crate::logic::flatterm::FlatSymbol;
use crate::logic::interner::{BankId, Signature, SymbolId};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a symbol.
///
/// The derived order is the category rank used by the index for sibling
/// ordering and by KBO precedence: connectives above quantifiers above
/// signature symbols.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SymbolKind {
    IndividualConstant,
    Function,
    Predicate,
    Quantifier,
    Connective,
}

impl SymbolKind {
    /// Connectives and quantifiers
    pub fn is_logical(self) -> bool {
        matches!(self, SymbolKind::Quantifier | SymbolKind::Connective)
    }
}

/// A non-variable symbol: identity, category and arity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub kind: SymbolKind,
    pub arity: u8,
}

impl Symbol {
    pub const EQUALITY: Symbol = Symbol {
        id: SymbolId::EQUALITY,
        kind: SymbolKind::Predicate,
        arity: 2,
    };

    pub fn is_equality(&self) -> bool {
        self.id == SymbolId::EQUALITY
    }

    /// Function, constant or predicate (as opposed to logical symbols)
    pub fn is_signature_symbol(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::IndividualConstant | SymbolKind::Function | SymbolKind::Predicate
        )
    }

    pub fn name<'a>(&self, signature: &'a Signature) -> &'a str {
        signature.resolve(self.id)
    }
}

/// Built-in connectives
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Connective {
    Not,
    And,
    Or,
    Implies,
    Equivalent,
}

impl Connective {
    pub const ALL: [Connective; 5] = [
        Connective::Not,
        Connective::And,
        Connective::Or,
        Connective::Implies,
        Connective::Equivalent,
    ];

    pub const fn symbol(self) -> Symbol {
        Symbol {
            id: SymbolId(1 + self as u32),
            kind: SymbolKind::Connective,
            arity: match self {
                Connective::Not => 1,
                _ => 2,
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Connective::Not => "~",
            Connective::And => "&",
            Connective::Or => "|",
            Connective::Implies => "=>",
            Connective::Equivalent => "<=>",
        }
    }
}

/// Built-in quantifiers
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quantifier {
    Forall,
    Exists,
}

impl Quantifier {
    pub const ALL: [Quantifier; 2] = [Quantifier::Forall, Quantifier::Exists];

    pub const fn symbol(self) -> Symbol {
        Symbol {
            id: SymbolId(6 + self as u32),
            kind: SymbolKind::Quantifier,
            arity: 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Quantifier::Forall => "!",
            Quantifier::Exists => "?",
        }
    }
}

/// A variable: a bank and an index within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Variable {
    pub bank: BankId,
    pub index: u32,
}

impl Variable {
    pub fn new(bank: BankId, index: u32) -> Self {
        Variable { bank, index }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bank.as_u16() == 0 {
            write!(f, "X{}", self.index)
        } else {
            write!(f, "X{}@{}", self.index, self.bank.as_u16())
        }
    }
}

/// A term or formula.
///
/// Quantified formulas hold an abstraction as their single argument:
/// `! [X] : p(X)` is `Quantifier(forall, Abstraction(X, Atom(p, [X])))`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    Variable(Variable),
    Constant(Symbol),
    Function(Symbol, Vec<Term>),
    Atom(Symbol, Vec<Term>),
    Connective(Symbol, Vec<Term>),
    Quantifier(Symbol, Box<Term>),
    Abstraction(Variable, Box<Term>),
}

impl Term {
    /// Build a function application, or a constant for an empty argument list
    pub fn function(symbol: Symbol, args: Vec<Term>) -> Term {
        debug_assert_eq!(symbol.arity as usize, args.len());
        if args.is_empty() {
            Term::Constant(symbol)
        } else {
            Term::Function(symbol, args)
        }
    }

    pub fn atom(predicate: Symbol, args: Vec<Term>) -> Term {
        debug_assert_eq!(predicate.arity as usize, args.len());
        Term::Atom(predicate, args)
    }

    pub fn equality(left: Term, right: Term) -> Term {
        Term::Atom(Symbol::EQUALITY, vec![left, right])
    }

    pub fn connective(connective: Connective, args: Vec<Term>) -> Term {
        debug_assert_eq!(connective.symbol().arity as usize, args.len());
        Term::Connective(connective.symbol(), args)
    }

    pub fn quantified(quantifier: Quantifier, variable: Variable, body: Term) -> Term {
        Term::Quantifier(
            quantifier.symbol(),
            Box::new(Term::Abstraction(variable, Box::new(body))),
        )
    }

    /// The top symbol as it appears in a flatterm cell
    pub fn head(&self) -> FlatSymbol {
        match self {
            Term::Variable(v) => FlatSymbol::Variable(*v),
            Term::Constant(s)
            | Term::Function(s, _)
            | Term::Atom(s, _)
            | Term::Connective(s, _)
            | Term::Quantifier(s, _) => FlatSymbol::Symbol(*s),
            Term::Abstraction(v, _) => FlatSymbol::Abstraction(*v),
        }
    }

    /// Immediate arguments
    pub fn args(&self) -> &[Term] {
        match self {
            Term::Variable(_) | Term::Constant(_) => &[],
            Term::Function(_, args) | Term::Atom(_, args) | Term::Connective(_, args) => args,
            Term::Quantifier(_, body) | Term::Abstraction(_, body) => std::slice::from_ref(&**body),
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    pub fn as_variable(&self) -> Option<Variable> {
        match self {
            Term::Variable(v) => Some(*v),
            _ => None,
        }
    }

    /// Prefix-order symbol sequence, without recursion
    pub fn symbols(&self) -> TermSymbols<'_> {
        TermSymbols { stack: vec![self] }
    }

    /// Number of symbols (cells of the flattened form)
    pub fn symbol_count(&self) -> usize {
        self.symbols().count()
    }

    pub fn contains_variable(&self, var: Variable) -> bool {
        self.symbols().any(|s| s == FlatSymbol::Variable(var))
    }

    /// True when no quantifier or abstraction occurs anywhere
    pub fn is_quantifier_free(&self) -> bool {
        self.symbols().all(|s| match s {
            FlatSymbol::Abstraction(_) => false,
            FlatSymbol::Symbol(sym) => sym.kind != SymbolKind::Quantifier,
            FlatSymbol::Variable(_) => true,
        })
    }

    /// Variables with an occurrence not bound by an enclosing abstraction,
    /// in order of first occurrence
    pub fn free_variables(&self) -> IndexSet<Variable> {
        enum Visit<'a> {
            Enter(&'a Term),
            Unbind,
        }
        let mut free = IndexSet::new();
        let mut bound: Vec<Variable> = Vec::new();
        let mut stack = vec![Visit::Enter(self)];
        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Unbind => {
                    bound.pop();
                }
                Visit::Enter(Term::Variable(v)) => {
                    if !bound.contains(v) {
                        free.insert(*v);
                    }
                }
                Visit::Enter(Term::Abstraction(v, body)) => {
                    bound.push(*v);
                    stack.push(Visit::Unbind);
                    stack.push(Visit::Enter(body));
                }
                Visit::Enter(term) => {
                    stack.extend(term.args().iter().rev().map(Visit::Enter));
                }
            }
        }
        free
    }

    pub fn display<'a>(&'a self, signature: &'a Signature) -> TermDisplay<'a> {
        TermDisplay {
            term: self,
            signature,
        }
    }
}

/// Prefix-order walk over the symbols of a [`Term`].
#[derive(Debug, Clone)]
pub struct TermSymbols<'a> {
    stack: Vec<&'a Term>,
}

impl<'a> Iterator for TermSymbols<'a> {
    type Item = FlatSymbol;

    fn next(&mut self) -> Option<FlatSymbol> {
        let term = self.stack.pop()?;
        self.stack.extend(term.args().iter().rev());
        Some(term.head())
    }
}

/// Display wrapper resolving symbol names through a signature
pub struct TermDisplay<'a> {
    term: &'a Term,
    signature: &'a Signature,
}

impl<'a> fmt::Display for TermDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sig = self.signature;
        match self.term {
            Term::Variable(v) => write!(f, "{}", v),
            Term::Constant(s) => write!(f, "{}", s.name(sig)),
            Term::Atom(s, args) if s.is_equality() => write!(
                f,
                "{} = {}",
                args[0].display(sig),
                args[1].display(sig)
            ),
            Term::Connective(s, args) if args.len() == 1 => {
                write!(f, "{}{}", s.name(sig), args[0].display(sig))
            }
            Term::Connective(s, args) => write!(
                f,
                "({} {} {})",
                args[0].display(sig),
                s.name(sig),
                args[1].display(sig)
            ),
            Term::Function(s, args) | Term::Atom(s, args) => {
                write!(f, "{}(", s.name(sig))?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", arg.display(sig))?;
                }
                write!(f, ")")
            }
            Term::Quantifier(s, body) => match &**body {
                Term::Abstraction(v, matrix) => {
                    write!(f, "{} [{}] : {}", s.name(sig), v, matrix.display(sig))
                }
                other => write!(f, "{} {}", s.name(sig), other.display(sig)),
            },
            Term::Abstraction(v, body) => write!(f, "^[{}] : {}", v, body.display(sig)),
        }
    }
}
