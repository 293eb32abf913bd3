//! Knuth-Bendix ordering without recursion
//!
//! A comparison makes two passes over the prefix symbol sequences of the
//! terms: one building the weight polynomials, one comparing symbols
//! position by position. Both passes work on any symbol stream, which is how
//! the tree-term, flatterm and "modulo a one-level substitution" variants
//! share one implementation.

use super::weight::{WeightComparison, WeightPolynomial};
use crate::error::ConfigError;
use crate::logic::core::term::{Symbol, Term};
use crate::logic::flatterm::{FlatSymbol, Subterm};
use crate::logic::interner::{Signature, SymbolId};
use crate::logic::unification::{MatcherSubstitution, TermSubstitution};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Result of comparing two terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TermOrdering {
    Smaller,
    Equivalent,
    Greater,
    Incomparable,
}

impl TermOrdering {
    pub fn flip(self) -> Self {
        match self {
            TermOrdering::Smaller => TermOrdering::Greater,
            TermOrdering::Greater => TermOrdering::Smaller,
            other => other,
        }
    }
}

/// KBO weights and precedences as written in a configuration file, by name
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KboSettings {
    pub symbol_weights: HashMap<String, usize>,
    pub symbol_precedence: HashMap<String, usize>,
    pub variable_weight: usize,
}

impl Default for KboSettings {
    fn default() -> Self {
        KboSettings {
            symbol_weights: HashMap::new(),
            symbol_precedence: HashMap::new(),
            variable_weight: 1,
        }
    }
}

/// Configuration for Knuth-Bendix Ordering
#[derive(Debug, Clone)]
pub struct KboConfig {
    /// Weight of each signature symbol (default weight is 1)
    pub weights: HashMap<SymbolId, usize>,
    /// Priority of each signature symbol, higher is greater (default is 0)
    pub precedence: HashMap<SymbolId, usize>,
    /// Minimal weight of any instance of a variable (must be positive)
    pub variable_weight: usize,
}

impl Default for KboConfig {
    fn default() -> Self {
        KboConfig {
            weights: HashMap::new(),
            precedence: HashMap::new(),
            variable_weight: 1,
        }
    }
}

impl KboConfig {
    /// Resolve name-keyed settings through a signature.
    ///
    /// A name applies to every symbol carrying it, whatever its arity.
    pub fn from_settings(signature: &Signature, settings: &KboSettings) -> Result<Self, ConfigError> {
        if settings.variable_weight == 0 {
            return Err(ConfigError::ZeroVariableWeight);
        }
        let mut config = KboConfig {
            variable_weight: settings.variable_weight,
            ..Default::default()
        };
        for (name, &weight) in &settings.symbol_weights {
            let ids = signature.lookup_name(name);
            if ids.is_empty() {
                return Err(ConfigError::UnknownSymbol(name.clone()));
            }
            for &id in ids {
                config.weights.insert(id, weight);
            }
        }
        for (name, &priority) in &settings.symbol_precedence {
            let ids = signature.lookup_name(name);
            if ids.is_empty() {
                return Err(ConfigError::UnknownSymbol(name.clone()));
            }
            for &id in ids {
                config.precedence.insert(id, priority);
            }
        }
        Ok(config)
    }
}

/// Knuth-Bendix Ordering over prefix symbol sequences
#[derive(Debug, Clone, Default)]
pub struct NonrecursiveKbo {
    config: KboConfig,
}

impl NonrecursiveKbo {
    pub fn new(config: KboConfig) -> Self {
        NonrecursiveKbo { config }
    }

    pub fn config(&self) -> &KboConfig {
        &self.config
    }

    /// Weight of a symbol; logical symbols weigh 1
    pub fn symbol_weight(&self, symbol: Symbol) -> i64 {
        if !symbol.is_signature_symbol() {
            return 1;
        }
        self.config.weights.get(&symbol.id).copied().unwrap_or(1) as i64
    }

    pub fn variable_weight(&self) -> i64 {
        self.config.variable_weight as i64
    }

    /// Precedence: connectives > quantifiers > signature symbols, signature
    /// symbols by priority then id, logical symbols by id
    pub fn precedence(&self, a: Symbol, b: Symbol) -> Ordering {
        a.kind
            .is_logical()
            .cmp(&b.kind.is_logical())
            .then_with(|| {
                if a.is_signature_symbol() && b.is_signature_symbol() {
                    self.priority(a).cmp(&self.priority(b))
                } else {
                    a.kind.cmp(&b.kind)
                }
            })
            .then_with(|| a.id.cmp(&b.id))
    }

    fn priority(&self, symbol: Symbol) -> usize {
        self.config.precedence.get(&symbol.id).copied().unwrap_or(0)
    }

    /// Weight polynomial of a symbol sequence
    pub fn weigh(&self, symbols: impl Iterator<Item = FlatSymbol>) -> WeightPolynomial {
        let mut weight = WeightPolynomial::new();
        for symbol in symbols {
            match symbol {
                FlatSymbol::Variable(v) => {
                    weight.add_variable(v);
                    weight.add_weight(self.variable_weight());
                }
                FlatSymbol::Symbol(s) => weight.add_weight(self.symbol_weight(s)),
                FlatSymbol::Abstraction(_) => weight.add_weight(1),
            }
        }
        weight
    }

    pub fn weight(&self, term: &Term) -> WeightPolynomial {
        self.weigh(term.symbols())
    }

    /// Compare two prefix symbol sequences
    pub fn compare_symbols<A, B>(&self, a: A, b: B) -> TermOrdering
    where
        A: Iterator<Item = FlatSymbol> + Clone,
        B: Iterator<Item = FlatSymbol> + Clone,
    {
        let weights = self.weigh(a.clone()).compare(&self.weigh(b.clone()));
        match weights {
            WeightComparison::AlwaysSmaller => TermOrdering::Smaller,
            WeightComparison::AlwaysGreater => TermOrdering::Greater,
            WeightComparison::Volatile => TermOrdering::Incomparable,
            WeightComparison::AlwaysEquivalent => self.lexicographic(a, b),
            WeightComparison::CanBeSmallerOrEquivalent => match self.lexicographic(a, b) {
                TermOrdering::Smaller => TermOrdering::Smaller,
                _ => TermOrdering::Incomparable,
            },
            WeightComparison::CanBeGreaterOrEquivalent => match self.lexicographic(a, b) {
                TermOrdering::Greater => TermOrdering::Greater,
                _ => TermOrdering::Incomparable,
            },
        }
    }

    /// Position-by-position comparison; the first difference decides
    fn lexicographic(
        &self,
        a: impl Iterator<Item = FlatSymbol>,
        b: impl Iterator<Item = FlatSymbol>,
    ) -> TermOrdering {
        let mut b = b;
        for x in a {
            let Some(y) = b.next() else {
                return TermOrdering::Incomparable;
            };
            match (x, y) {
                (FlatSymbol::Symbol(s), FlatSymbol::Symbol(t)) => {
                    if s != t {
                        return match self.precedence(s, t) {
                            Ordering::Greater => TermOrdering::Greater,
                            Ordering::Less => TermOrdering::Smaller,
                            Ordering::Equal => TermOrdering::Incomparable,
                        };
                    }
                }
                (FlatSymbol::Variable(u), FlatSymbol::Variable(v))
                | (FlatSymbol::Abstraction(u), FlatSymbol::Abstraction(v)) => {
                    if u != v {
                        return TermOrdering::Incomparable;
                    }
                }
                _ => return TermOrdering::Incomparable,
            }
        }
        match b.next() {
            None => TermOrdering::Equivalent,
            Some(_) => TermOrdering::Incomparable,
        }
    }

    pub fn compare(&self, a: &Term, b: &Term) -> TermOrdering {
        self.compare_symbols(a.symbols(), b.symbols())
    }

    pub fn compare_flat(&self, a: &Subterm, b: &Subterm) -> TermOrdering {
        self.compare_symbols(a.symbols(), b.symbols())
    }

    /// Compare the instances of `a` and `b` under a one-level substitution
    pub fn compare_flat_modulo(&self, a: &Subterm, b: &Subterm, subst: &MatcherSubstitution) -> TermOrdering {
        self.compare_symbols(subst.symbols(a), subst.symbols(b))
    }

    /// Compare the instances of `a` and `b` under a one-level tree-term substitution
    pub fn compare_modulo(&self, a: &Term, b: &Term, subst: &TermSubstitution) -> TermOrdering {
        self.compare_symbols(subst.symbols(a), subst.symbols(b))
    }

    /// Can some instantiation of `a`'s variables make `a` greater than `b`?
    ///
    /// False positives are allowed, false negatives are not.
    pub fn can_be_greater(&self, a: &Term, b: &Term) -> bool {
        let vars = a.free_variables();
        if b.free_variables().iter().any(|v| !vars.contains(v)) {
            return false;
        }
        matches!(self.compare(a, b), TermOrdering::Greater | TermOrdering::Incomparable)
    }

    pub fn can_be_greater_flat(&self, a: &Subterm, b: &Subterm) -> bool {
        let vars = a.variables();
        if b.variables().iter().any(|v| !vars.contains(v)) {
            return false;
        }
        matches!(self.compare_flat(a, b), TermOrdering::Greater | TermOrdering::Incomparable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::interner::VariableBank;

    struct TestCtx {
        sig: Signature,
        bank: VariableBank,
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
    fn test_term_weight() {
        let mut ctx = TestCtx::new();
        let x = ctx.var(0);
        let a = ctx.const_("a");
        let fax = ctx.func("f", vec![a.clone(), x.clone()]);

        let kbo = NonrecursiveKbo::default();
        assert_eq!(kbo.weight(&x).constant(), 1);
        assert_eq!(kbo.weight(&a).constant(), 1);
        // f(1) + a(1) + X(1)
        let w = kbo.weight(&fax);
        assert_eq!(w.constant(), 3);
        assert_eq!(w.coefficient(ctx.bank.get(0)), 1);
    }

    #[test]
    fn test_heavier_term_is_greater() {
        let mut ctx = TestCtx::new();
        let a = ctx.const_("a");
        let fa = ctx.func("f", vec![a.clone()]);
        let kbo = NonrecursiveKbo::default();
        assert_eq!(kbo.compare(&fa, &a), TermOrdering::Greater);
        assert_eq!(kbo.compare(&a, &fa), TermOrdering::Smaller);
        assert_eq!(kbo.compare(&fa, &fa), TermOrdering::Equivalent);
    }

    #[test]
    fn test_variable_condition() {
        let mut ctx = TestCtx::new();
        let x = ctx.var(0);
        let y = ctx.var(1);
        let fx = ctx.func("f", vec![x.clone()]);
        let kbo = NonrecursiveKbo::default();

        // f(X) > X
        assert_eq!(kbo.compare(&fx, &x), TermOrdering::Greater);
        // f(X) vs Y: Y can be instantiated with something heavy
        assert_eq!(kbo.compare(&fx, &y), TermOrdering::Incomparable);
        // X vs Y
        assert_eq!(kbo.compare(&x, &y), TermOrdering::Incomparable);
    }

    #[test]
    fn test_precedence_breaks_weight_ties() {
        let mut ctx = TestCtx::new();
        let a = ctx.const_("a");
        let b = ctx.const_("b");
        let x = ctx.var(0);
        // default precedence falls back to id: b was interned after a
        let kbo = NonrecursiveKbo::default();
        assert_eq!(kbo.compare(&b, &a), TermOrdering::Greater);

        let settings = KboSettings {
            symbol_precedence: [("a".to_string(), 5)].into_iter().collect(),
            ..Default::default()
        };
        let kbo = NonrecursiveKbo::new(KboConfig::from_settings(&ctx.sig, &settings).unwrap());
        assert_eq!(kbo.compare(&a, &b), TermOrdering::Greater);

        // g(X, a) vs g(X, b): equal weights, decided at the constants
        let gxa = ctx.func("g", vec![x.clone(), a.clone()]);
        let gxb = ctx.func("g", vec![x.clone(), b.clone()]);
        assert_eq!(kbo.compare(&gxa, &gxb), TermOrdering::Greater);
    }

    #[test]
    fn test_equal_weight_with_variable_excess() {
        let mut ctx = TestCtx::new();
        let x = ctx.var(0);
        let a = ctx.const_("a");
        let fxx = ctx.func("f", vec![x.clone(), x.clone()]);
        let fxa = ctx.func("f", vec![x.clone(), a.clone()]);
        let kbo = NonrecursiveKbo::default();
        // equal when X = a, so never strictly greater
        assert_eq!(kbo.compare(&fxx, &fxa), TermOrdering::Incomparable);
    }

    #[test]
    fn test_weights_from_settings() {
        let mut ctx = TestCtx::new();
        let a = ctx.const_("a");
        let b = ctx.const_("b");
        let settings = KboSettings {
            symbol_weights: [("a".to_string(), 4)].into_iter().collect(),
            ..Default::default()
        };
        let kbo = NonrecursiveKbo::new(KboConfig::from_settings(&ctx.sig, &settings).unwrap());
        let fb = ctx.func("f", vec![b.clone()]);
        assert_eq!(kbo.compare(&a, &fb), TermOrdering::Greater);

        let bad = KboSettings {
            symbol_weights: [("nope".to_string(), 2)].into_iter().collect(),
            ..Default::default()
        };
        assert!(matches!(
            KboConfig::from_settings(&ctx.sig, &bad),
            Err(ConfigError::UnknownSymbol(_))
        ));
    }

    #[test]
    fn test_compare_modulo_one_level_substitution() {
        let mut ctx = TestCtx::new();
        let x = ctx.var(0);
        let y = ctx.var(1);
        let a = ctx.const_("a");
        let gy = ctx.func("g", vec![y.clone()]);
        let kbo = NonrecursiveKbo::default();

        let mut subst = TermSubstitution::new();
        subst.bind(ctx.bank.get(0), gy.clone());
        // X{X -> g(Y)} vs Y: g(Y) > Y
        assert_eq!(kbo.compare_modulo(&x, &y, &subst), TermOrdering::Greater);
        assert_eq!(kbo.compare(&x, &y), TermOrdering::Incomparable);

        let mut flat = MatcherSubstitution::new();
        flat.bind(ctx.bank.get(0), Subterm::from_term(&a));
        let fx = ctx.func("f", vec![x.clone()]);
        let fa = ctx.func("f", vec![a.clone()]);
        assert_eq!(
            kbo.compare_flat_modulo(&Subterm::from_term(&fx), &Subterm::from_term(&fa), &flat),
            TermOrdering::Equivalent
        );
    }

    #[test]
    fn test_can_be_greater() {
        let mut ctx = TestCtx::new();
        let x = ctx.var(0);
        let y = ctx.var(1);
        let a = ctx.const_("a");
        let fx = ctx.func("f", vec![x.clone()]);
        let fa = ctx.func("f", vec![a.clone()]);
        let kbo = NonrecursiveKbo::default();

        assert!(!kbo.can_be_greater(&x, &fx));
        assert!(kbo.can_be_greater(&fx, &x));
        // X could become f(f(a))
        assert!(kbo.can_be_greater(&x, &a));
        // Y is not among X's variables
        assert!(!kbo.can_be_greater(&fx, &y));
        assert!(!kbo.can_be_greater(&a, &fa));
        assert!(kbo.can_be_greater_flat(&Subterm::from_term(&fa), &Subterm::from_term(&a)));
    }
}
