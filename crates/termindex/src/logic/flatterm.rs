//! Flatterms: terms stored as a contiguous prefix-order sequence of cells.
//!
//! Every cell records its symbol and the position one past the end of the
//! subterm it starts, so "skip this subterm" is a single lookup and walking
//! needs no recursion. Flatterms are immutable once built and shared through
//! `Rc`; a [`Subterm`] is such a handle plus a cell position, and is what the
//! substitution ledgers store as variable instances.

use crate::logic::core::term::{Symbol, SymbolKind, Term, Variable};
use indexmap::IndexSet;
use std::rc::Rc;

/// The symbol stored in a flatterm cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlatSymbol {
    Variable(Variable),
    Symbol(Symbol),
    /// Binder of a quantified formula; its single argument is the body
    Abstraction(Variable),
}

impl FlatSymbol {
    pub fn arity(&self) -> usize {
        match self {
            FlatSymbol::Variable(_) => 0,
            FlatSymbol::Symbol(s) => s.arity as usize,
            FlatSymbol::Abstraction(_) => 1,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, FlatSymbol::Variable(_))
    }

    pub fn as_variable(&self) -> Option<Variable> {
        match self {
            FlatSymbol::Variable(v) => Some(*v),
            _ => None,
        }
    }

    /// Quantifiers and abstractions, which the index and matching refuse
    pub fn is_binder(&self) -> bool {
        match self {
            FlatSymbol::Abstraction(_) => true,
            FlatSymbol::Symbol(s) => s.kind == SymbolKind::Quantifier,
            FlatSymbol::Variable(_) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub symbol: FlatSymbol,
    after: u32,
}

impl Cell {
    /// Index one past the last cell of the subterm starting here
    pub fn after(&self) -> usize {
        self.after as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flatterm {
    cells: Vec<Cell>,
}

impl Flatterm {
    pub fn from_term(term: &Term) -> Self {
        Self::from_prefix(term.symbols())
    }

    /// Build from a prefix-order symbol sequence describing exactly one term.
    ///
    /// Panics if the sequence is not a single complete term.
    pub fn from_prefix(symbols: impl IntoIterator<Item = FlatSymbol>) -> Self {
        let mut cells: Vec<Cell> = Vec::new();
        // (cell index, arguments still missing)
        let mut open: Vec<(usize, usize)> = Vec::new();
        let mut complete = false;
        for symbol in symbols {
            assert!(!complete, "prefix sequence continues past a complete term");
            let index = cells.len();
            cells.push(Cell { symbol, after: 0 });
            let arity = symbol.arity();
            if arity > 0 {
                open.push((index, arity));
                continue;
            }
            let end = (index + 1) as u32;
            cells[index].after = end;
            loop {
                match open.last_mut() {
                    None => {
                        complete = true;
                        break;
                    }
                    Some((start, missing)) => {
                        *missing -= 1;
                        if *missing > 0 {
                            break;
                        }
                        cells[*start].after = end;
                        open.pop();
                    }
                }
            }
        }
        assert!(complete, "prefix sequence ends inside a term");
        Flatterm { cells }
    }

    pub fn variable(var: Variable) -> Self {
        Flatterm {
            cells: vec![Cell {
                symbol: FlatSymbol::Variable(var),
                after: 1,
            }],
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, pos: usize) -> &Cell {
        &self.cells[pos]
    }

    pub fn symbol(&self, pos: usize) -> FlatSymbol {
        self.cells[pos].symbol
    }

    pub fn after(&self, pos: usize) -> usize {
        self.cells[pos].after()
    }

    pub fn to_term(&self) -> Term {
        self.term_at(0)
    }

    /// Rebuild the tree form of the subterm starting at `pos`
    pub fn term_at(&self, pos: usize) -> Term {
        let mut built: Vec<Term> = Vec::new();
        for cell in self.cells[pos..self.after(pos)].iter().rev() {
            let arity = cell.symbol.arity();
            let mut args: Vec<Term> = Vec::with_capacity(arity);
            for _ in 0..arity {
                match built.pop() {
                    Some(arg) => args.push(arg),
                    None => panic!("malformed flatterm"),
                }
            }
            built.push(match cell.symbol {
                FlatSymbol::Variable(v) => Term::Variable(v),
                FlatSymbol::Abstraction(v) => Term::Abstraction(v, Box::new(single(args))),
                FlatSymbol::Symbol(s) => match s.kind {
                    SymbolKind::IndividualConstant => Term::Constant(s),
                    SymbolKind::Function => Term::Function(s, args),
                    SymbolKind::Predicate => Term::Atom(s, args),
                    SymbolKind::Connective => Term::Connective(s, args),
                    SymbolKind::Quantifier => Term::Quantifier(s, Box::new(single(args))),
                },
            });
        }
        single(built)
    }
}

fn single(mut terms: Vec<Term>) -> Term {
    match (terms.pop(), terms.is_empty()) {
        (Some(term), true) => term,
        _ => panic!("malformed flatterm"),
    }
}

/// Prefix-order symbols of a subterm
pub type FlatSymbols<'a> = std::iter::Map<std::slice::Iter<'a, Cell>, fn(&Cell) -> FlatSymbol>;

fn cell_symbol(cell: &Cell) -> FlatSymbol {
    cell.symbol
}

/// A shared handle on the subterm of a flatterm starting at a given cell.
///
/// Equality is structural: two handles are equal when their cell sequences
/// carry the same symbols.
#[derive(Debug, Clone)]
pub struct Subterm {
    term: Rc<Flatterm>,
    pos: u32,
}

impl Subterm {
    pub fn new(term: Rc<Flatterm>) -> Self {
        Subterm { term, pos: 0 }
    }

    pub fn at(term: Rc<Flatterm>, pos: usize) -> Self {
        debug_assert!(pos < term.len());
        Subterm {
            term,
            pos: pos as u32,
        }
    }

    pub fn from_term(term: &Term) -> Self {
        Subterm::new(Rc::new(Flatterm::from_term(term)))
    }

    pub fn variable(var: Variable) -> Self {
        Subterm::new(Rc::new(Flatterm::variable(var)))
    }

    pub fn flatterm(&self) -> &Rc<Flatterm> {
        &self.term
    }

    pub fn pos(&self) -> usize {
        self.pos as usize
    }

    pub fn end(&self) -> usize {
        self.term.after(self.pos())
    }

    pub fn len(&self) -> usize {
        self.end() - self.pos()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn symbol(&self) -> FlatSymbol {
        self.term.symbol(self.pos())
    }

    pub fn as_variable(&self) -> Option<Variable> {
        self.symbol().as_variable()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.term.cells()[self.pos()..self.end()]
    }

    pub fn symbols(&self) -> FlatSymbols<'_> {
        self.cells().iter().map(cell_symbol as fn(&Cell) -> FlatSymbol)
    }

    /// The immediate argument subterms
    pub fn args(&self) -> SubtermArgs<'_> {
        SubtermArgs {
            term: &self.term,
            next: self.pos() + 1,
            remaining: self.symbol().arity(),
        }
    }

    pub fn arg(&self, n: usize) -> Subterm {
        match self.args().nth(n) {
            Some(arg) => arg,
            None => panic!("argument {} out of range for arity {}", n, self.symbol().arity()),
        }
    }

    pub fn to_term(&self) -> Term {
        self.term.term_at(self.pos())
    }

    pub fn contains_variable(&self, var: Variable) -> bool {
        self.symbols().any(|s| s == FlatSymbol::Variable(var))
    }

    pub fn is_quantifier_free(&self) -> bool {
        !self.symbols().any(|s| s.is_binder())
    }

    /// Variable symbols occurring in the subterm, in order of first occurrence
    pub fn variables(&self) -> IndexSet<Variable> {
        self.symbols().filter_map(|s| s.as_variable()).collect()
    }

    /// Same flatterm and same position
    pub fn is_same(&self, other: &Subterm) -> bool {
        Rc::ptr_eq(&self.term, &other.term) && self.pos == other.pos
    }
}

impl PartialEq for Subterm {
    fn eq(&self, other: &Self) -> bool {
        self.is_same(other) || self.symbols().eq(other.symbols())
    }
}

impl Eq for Subterm {}

/// Iterator over the argument subterms of a cell
pub struct SubtermArgs<'a> {
    term: &'a Rc<Flatterm>,
    next: usize,
    remaining: usize,
}

impl<'a> Iterator for SubtermArgs<'a> {
    type Item = Subterm;

    fn next(&mut self) -> Option<Subterm> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let arg = Subterm::at(self.term.clone(), self.next);
        self.next = self.term.after(self.next);
        Some(arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::core::term::Quantifier;
    use crate::logic::interner::Signature;

    #[test]
    fn test_after_positions() {
        let mut sig = Signature::new();
        let mut bank = sig.new_bank();
        let f = sig.intern_function("f", 2);
        let g = sig.intern_function("g", 1);
        let a = sig.intern_constant("a");
        let x = bank.fresh();

        // f(g(a), X)
        let t = Term::function(
            f,
            vec![Term::function(g, vec![Term::Constant(a)]), Term::Variable(x)],
        );
        let flat = Flatterm::from_term(&t);
        let afters: Vec<usize> = flat.cells().iter().map(Cell::after).collect();
        assert_eq!(afters, vec![4, 3, 3, 4]);
        assert_eq!(flat.to_term(), t);
    }

    #[test]
    fn test_subterm_args() {
        let mut sig = Signature::new();
        let h = sig.intern_function("h", 3);
        let g = sig.intern_function("g", 1);
        let a = sig.intern_constant("a");
        let b = sig.intern_constant("b");

        // h(g(a), b, a)
        let t = Term::function(
            h,
            vec![
                Term::function(g, vec![Term::Constant(a)]),
                Term::Constant(b),
                Term::Constant(a),
            ],
        );
        let sub = Subterm::from_term(&t);
        let args: Vec<Term> = sub.args().map(|s| s.to_term()).collect();
        assert_eq!(args, t.args().to_vec());
        assert_eq!(sub.arg(1).pos(), 3);
        assert_eq!(sub.arg(0).len(), 2);
        // Structural equality across different flatterms
        assert_eq!(sub.arg(2), Subterm::from_term(&Term::Constant(a)));
        assert_ne!(sub.arg(1), sub.arg(2));
    }

    #[test]
    fn test_binders_round_trip() {
        let mut sig = Signature::new();
        let mut bank = sig.new_bank();
        let p = sig.intern_predicate("p", 1);
        let x = bank.fresh();
        let formula = Term::quantified(
            Quantifier::Exists,
            x,
            Term::atom(p, vec![Term::Variable(x)]),
        );
        let sub = Subterm::from_term(&formula);
        assert!(!sub.is_quantifier_free());
        assert_eq!(sub.len(), 4);
        assert_eq!(sub.to_term(), formula);
    }

    #[test]
    #[should_panic(expected = "ends inside a term")]
    fn test_incomplete_prefix_panics() {
        let mut sig = Signature::new();
        let f = sig.intern_function("f", 2);
        let a = sig.intern_constant("a");
        Flatterm::from_prefix(vec![FlatSymbol::Symbol(f), FlatSymbol::Symbol(a)]);
    }
}
