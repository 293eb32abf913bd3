//! Substitution ledgers
//!
//! A ledger maps variables to instances and records every binding on a trail
//! so that it can be undone in reverse order. Three ledgers exist, one per
//! matching flavor, and they are distinct types so a binding made for one
//! purpose cannot be read through another:
//!
//! - [`UnifierSubstitution`] stores flatterm subterms and is dereferenced
//!   transitively. Unification keeps it acyclic.
//! - [`MatcherSubstitution`] stores flatterm subterms and is dereferenced one
//!   level only, so cyclic bindings are harmless.
//! - [`TermSubstitution`] stores tree terms, one level only.

use crate::logic::core::term::{Term, Variable};
use crate::logic::flatterm::{Cell, FlatSymbol, Flatterm, Subterm};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;

/// A position on a ledger's trail
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Savepoint(usize);

/// What a ledger stores and how it is read.
pub trait Flavor {
    type Instance: Clone + std::fmt::Debug;
}

/// Unification ledger: subterm instances, transitive dereferencing
#[derive(Debug, Clone, Copy, Default)]
pub struct Unifier;

/// Matching ledger: subterm instances, one-level dereferencing
#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher;

/// Tree-term matching ledger, one-level dereferencing
#[derive(Debug, Clone, Copy, Default)]
pub struct TermMatcher;

impl Flavor for Unifier {
    type Instance = Subterm;
}

impl Flavor for Matcher {
    type Instance = Subterm;
}

impl Flavor for TermMatcher {
    type Instance = Term;
}

pub type UnifierSubstitution = Substitution<Unifier>;
pub type MatcherSubstitution = Substitution<Matcher>;
pub type TermSubstitution = Substitution<TermMatcher>;

/// A backtrackable variable binding ledger.
#[derive(Debug, Clone)]
pub struct Substitution<F: Flavor> {
    map: HashMap<Variable, F::Instance>,
    trail: Vec<Variable>,
    _flavor: PhantomData<F>,
}

impl<F: Flavor> Default for Substitution<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Flavor> Substitution<F> {
    pub fn new() -> Self {
        Substitution {
            map: HashMap::new(),
            trail: Vec::new(),
            _flavor: PhantomData,
        }
    }

    pub fn with_capacity(var_count: usize) -> Self {
        Substitution {
            map: HashMap::with_capacity(var_count),
            trail: Vec::with_capacity(var_count),
            _flavor: PhantomData,
        }
    }

    /// Bind an unbound variable, recording it on the trail
    #[inline]
    pub fn bind(&mut self, var: Variable, instance: F::Instance) {
        debug_assert!(!self.map.contains_key(&var), "{} is already bound", var);
        self.trail.push(var);
        self.map.insert(var, instance);
    }

    #[inline]
    pub fn get(&self, var: Variable) -> Option<&F::Instance> {
        self.map.get(&var)
    }

    #[inline]
    pub fn is_bound(&self, var: Variable) -> bool {
        self.map.contains_key(&var)
    }

    #[inline]
    pub fn savepoint(&self) -> Savepoint {
        Savepoint(self.trail.len())
    }

    /// Undo the most recent binding, returning the variable it bound
    pub fn backtrack(&mut self) -> Option<Variable> {
        let var = self.trail.pop()?;
        self.map.remove(&var);
        Some(var)
    }

    /// Undo every binding made after `savepoint`
    pub fn backtrack_to(&mut self, savepoint: Savepoint) {
        debug_assert!(savepoint.0 <= self.trail.len(), "savepoint from the future");
        while self.trail.len() > savepoint.0 {
            self.backtrack();
        }
    }

    /// Uninstantiate every variable
    pub fn clear(&mut self) {
        self.map.clear();
        self.trail.clear();
    }

    /// Was `var` bound after `savepoint`?
    pub fn bound_since(&self, var: Variable, savepoint: Savepoint) -> bool {
        self.trail
            .get(savepoint.0..)
            .map_or(false, |recent| recent.contains(&var))
    }

    pub fn len(&self) -> usize {
        self.trail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trail.is_empty()
    }

    /// Bound variables in binding order
    pub fn variables(&self) -> &[Variable] {
        &self.trail
    }
}

// =============================================================================
// Unifier ledger
// =============================================================================

impl Substitution<Unifier> {
    /// Follow bindings until reaching a non-variable or an unbound variable
    pub fn deref(&self, term: &Subterm) -> Subterm {
        let mut current = term;
        while let Some(var) = current.as_variable() {
            match self.get(var) {
                Some(instance) => current = instance,
                None => break,
            }
        }
        current.clone()
    }

    /// Syntactic equality of the two instances
    pub fn equal(&self, a: &Subterm, b: &Subterm) -> bool {
        let mut pairs = vec![(a.clone(), b.clone())];
        while let Some((x, y)) = pairs.pop() {
            let x = self.deref(&x);
            let y = self.deref(&y);
            if x.is_same(&y) {
                continue;
            }
            if x.symbol() != y.symbol() {
                return false;
            }
            pairs.extend(x.args().zip(y.args()));
        }
        true
    }

    /// Does `var` occur in the instance of `term`?
    pub fn occurs(&self, var: Variable, term: &Subterm) -> bool {
        let mut pending = vec![term.clone()];
        while let Some(t) = pending.pop() {
            let t = self.deref(&t);
            match t.symbol() {
                FlatSymbol::Variable(v) => {
                    if v == var {
                        return true;
                    }
                }
                _ => pending.extend(t.args()),
            }
        }
        false
    }

    /// Prefix-order symbols of the fully instantiated term
    pub fn instance_symbols(&self, term: &Subterm) -> Vec<FlatSymbol> {
        let mut symbols = Vec::with_capacity(term.len());
        let mut pending = vec![term.clone()];
        while let Some(t) = pending.pop() {
            let t = self.deref(&t);
            symbols.push(t.symbol());
            let args: Vec<Subterm> = t.args().collect();
            pending.extend(args.into_iter().rev());
        }
        symbols
    }

    /// Build the fully instantiated term
    pub fn apply(&self, term: &Subterm) -> Term {
        Flatterm::from_prefix(self.instance_symbols(term)).to_term()
    }
}

// =============================================================================
// One-level ledgers
// =============================================================================

impl Substitution<Matcher> {
    /// The instance of a bound variable, or the subterm itself
    pub fn deref_once(&self, term: &Subterm) -> Subterm {
        match term.as_variable().and_then(|v| self.get(v)) {
            Some(instance) => instance.clone(),
            None => term.clone(),
        }
    }

    /// Equality after replacing each variable of `a` and `b` by its instance,
    /// without looking into the instances
    pub fn equal(&self, a: &Subterm, b: &Subterm) -> bool {
        self.symbols(a).eq(self.symbols(b))
    }

    /// Prefix-order symbols with bound variables spliced in one level deep
    pub fn symbols<'a>(&'a self, term: &'a Subterm) -> SplicedCells<'a> {
        SplicedCells {
            subst: self,
            frames: vec![(term.cells(), false)],
        }
    }

    /// Build the instance of `term` under this substitution
    pub fn apply(&self, term: &Subterm) -> Term {
        Flatterm::from_prefix(self.symbols(term)).to_term()
    }
}

/// Symbols of a flatterm with one-level instances spliced in
#[derive(Debug, Clone)]
pub struct SplicedCells<'a> {
    subst: &'a Substitution<Matcher>,
    // remaining cells, and whether they belong to an instance
    frames: Vec<(&'a [Cell], bool)>,
}

impl<'a> Iterator for SplicedCells<'a> {
    type Item = FlatSymbol;

    fn next(&mut self) -> Option<FlatSymbol> {
        loop {
            let &(cells, in_instance) = self.frames.last()?;
            let Some((cell, rest)) = cells.split_first() else {
                self.frames.pop();
                continue;
            };
            if let Some(top) = self.frames.last_mut() {
                top.0 = rest;
            }
            if let FlatSymbol::Variable(v) = cell.symbol {
                if !in_instance {
                    if let Some(instance) = self.subst.get(v) {
                        self.frames.push((instance.cells(), true));
                        continue;
                    }
                }
            }
            return Some(cell.symbol);
        }
    }
}

impl Substitution<TermMatcher> {
    pub fn deref_once<'a>(&'a self, term: &'a Term) -> &'a Term {
        match term.as_variable().and_then(|v| self.get(v)) {
            Some(instance) => instance,
            None => term,
        }
    }

    pub fn equal(&self, a: &Term, b: &Term) -> bool {
        self.symbols(a).eq(self.symbols(b))
    }

    /// Prefix-order symbols with bound variables spliced in one level deep
    pub fn symbols<'a>(&'a self, term: &'a Term) -> SplicedTerms<'a> {
        SplicedTerms {
            subst: self,
            stack: vec![(term, false)],
        }
    }

    pub fn apply(&self, term: &Term) -> Term {
        Flatterm::from_prefix(self.symbols(term)).to_term()
    }
}

/// Symbols of a tree term with one-level instances spliced in
#[derive(Debug, Clone)]
pub struct SplicedTerms<'a> {
    subst: &'a Substitution<TermMatcher>,
    stack: Vec<(&'a Term, bool)>,
}

impl<'a> Iterator for SplicedTerms<'a> {
    type Item = FlatSymbol;

    fn next(&mut self) -> Option<FlatSymbol> {
        loop {
            let (term, in_instance) = self.stack.pop()?;
            if let Term::Variable(v) = term {
                if !in_instance {
                    if let Some(instance) = self.subst.get(*v) {
                        self.stack.push((instance, true));
                        continue;
                    }
                }
            }
            self.stack
                .extend(term.args().iter().rev().map(|arg| (arg, in_instance)));
            return Some(term.head());
        }
    }
}

/// Wrap a symbol sequence into a fresh shared subterm
pub fn subterm_from_symbols(symbols: impl IntoIterator<Item = FlatSymbol>) -> Subterm {
    Subterm::new(Rc::new(Flatterm::from_prefix(symbols)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::interner::Signature;

    struct TestCtx {
        sig: Signature,
        bank: crate::logic::interner::VariableBank,
    }

    impl TestCtx {
        fn new() -> Self {
            let mut sig = Signature::new();
            let bank = sig.new_bank();
            TestCtx { sig, bank }
        }

        fn var(&mut self, index: u32) -> Term {
            Term::Variable(self.bank.get(index))
        }

        fn const_(&mut self, name: &str) -> Term {
            Term::Constant(self.sig.intern_constant(name))
        }

        fn func(&mut self, name: &str, args: Vec<Term>) -> Term {
            let f = self.sig.intern_function(name, args.len() as u8);
            Term::function(f, args)
        }
    }

    #[test]
    fn test_backtrack_restores_bindings() {
        let mut ctx = TestCtx::new();
        let x = ctx.bank.get(0);
        let y = ctx.bank.get(1);
        let a = ctx.const_("a");

        let mut subst = UnifierSubstitution::new();
        let sp = subst.savepoint();
        subst.bind(x, Subterm::from_term(&a));
        let mid = subst.savepoint();
        subst.bind(y, Subterm::variable(x));

        assert!(subst.bound_since(y, mid));
        assert!(!subst.bound_since(x, mid));
        assert!(subst.bound_since(x, sp));

        assert_eq!(subst.backtrack(), Some(y));
        assert!(!subst.is_bound(y));
        subst.backtrack_to(sp);
        assert!(subst.is_empty());
        assert_eq!(subst.backtrack(), None);
    }

    #[test]
    fn test_unifier_deref_is_transitive() {
        let mut ctx = TestCtx::new();
        let x = ctx.bank.get(0);
        let y = ctx.bank.get(1);
        let a = ctx.const_("a");
        let fy = ctx.func("f", vec![Term::Variable(y)]);

        let mut subst = UnifierSubstitution::new();
        subst.bind(x, Subterm::from_term(&fy));
        subst.bind(y, Subterm::from_term(&a));

        let fa = ctx.func("f", vec![a.clone()]);
        assert_eq!(subst.apply(&Subterm::variable(x)), fa);
        assert!(subst.equal(&Subterm::variable(x), &Subterm::from_term(&fa)));
        assert!(!subst.occurs(x, &Subterm::from_term(&a)));
        // bound variables are looked through, unbound ones are found
        let w = ctx.bank.get(3);
        let gw = ctx.func("g", vec![Term::Variable(w)]);
        let z = ctx.bank.get(2);
        subst.bind(z, Subterm::from_term(&gw));
        assert!(subst.occurs(w, &Subterm::variable(z)));
        assert!(!subst.occurs(y, &Subterm::variable(x)));
    }

    #[test]
    fn test_matcher_deref_is_one_level() {
        let mut ctx = TestCtx::new();
        let x = ctx.bank.get(0);
        let y = ctx.bank.get(1);
        let a = ctx.const_("a");
        let fy = ctx.func("f", vec![Term::Variable(y)]);
        let gx = ctx.func("g", vec![Term::Variable(x)]);

        let mut subst = MatcherSubstitution::new();
        subst.bind(x, Subterm::from_term(&fy));
        subst.bind(y, Subterm::from_term(&a));

        // g(X) becomes g(f(Y)), the Y inside the instance stays
        let expected = ctx.func("g", vec![fy.clone()]);
        assert_eq!(subst.apply(&Subterm::from_term(&gx)), expected);
        // so g(X) is not g(f(a)), although Y is bound to a
        let fa = ctx.func("f", vec![a.clone()]);
        let gfa = ctx.func("g", vec![fa]);
        assert!(!subst.equal(&Subterm::from_term(&gx), &Subterm::from_term(&gfa)));
        // on the other side Y is spliced: g(f(Y)) reads as g(f(a))
        assert!(subst.equal(&Subterm::from_term(&expected), &Subterm::from_term(&gfa)));
    }

    #[test]
    fn test_matcher_tolerates_cycles() {
        let mut ctx = TestCtx::new();
        let x = ctx.bank.get(0);
        let fx = ctx.func("f", vec![Term::Variable(x)]);

        let mut subst = MatcherSubstitution::new();
        subst.bind(x, Subterm::from_term(&fx));
        let ffx = ctx.func("f", vec![fx.clone()]);
        assert_eq!(subst.apply(&Subterm::from_term(&fx)), ffx);
    }

    #[test]
    fn test_term_ledger_equality() {
        let mut ctx = TestCtx::new();
        let x = ctx.bank.get(0);
        let a = ctx.const_("a");
        let hxa = ctx.func("h", vec![Term::Variable(x), a.clone()]);
        let haa = ctx.func("h", vec![a.clone(), a.clone()]);

        let mut subst = TermSubstitution::new();
        assert!(!subst.equal(&hxa, &haa));
        subst.bind(x, a.clone());
        assert!(subst.equal(&hxa, &haa));
        assert_eq!(subst.apply(&hxa), haa);
        assert_eq!(subst.deref_once(&ctx.var(0)), &a);
    }
}
