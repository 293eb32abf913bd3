//! Symbol interning and the signature
//!
//! Every function, constant and predicate symbol is interned once and
//! referred to by a [`SymbolId`] afterwards. Ids are unique per signature and
//! are what the orderings and indexes compare and hash.
//!
//! A handful of ids are reserved at construction:
//! - `0` is the equality predicate `=`
//! - `1..=5` are the connectives (see [`Connective`])
//! - `6..=7` are the quantifiers (see [`Quantifier`])
//!
//! Variables are not interned by name. They live in numbered banks (one bank
//! per clause copy, for instance) and are handed out by [`VariableBank`].

use crate::logic::core::term::{Connective, Quantifier, Symbol, SymbolKind, Variable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Id of an interned symbol
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub(crate) u32);

impl SymbolId {
    /// The reserved equality predicate
    pub const EQUALITY: SymbolId = SymbolId(0);

    /// Get the raw ID value (for debugging/serialization)
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Id of a variable bank
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BankId(pub(crate) u16);

impl BankId {
    pub fn as_u16(self) -> u16 {
        self.0
    }
}

/// Hands out fresh variables of a single bank.
#[derive(Debug, Clone)]
pub struct VariableBank {
    id: BankId,
    next: u32,
}

impl VariableBank {
    pub fn id(&self) -> BankId {
        self.id
    }

    /// A variable never returned before by this bank
    pub fn fresh(&mut self) -> Variable {
        let var = Variable::new(self.id, self.next);
        self.next += 1;
        var
    }

    /// The `index`-th variable of this bank, without advancing the counter
    pub fn get(&self, index: u32) -> Variable {
        Variable::new(self.id, index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SymbolKey {
    name: String,
    kind: SymbolKind,
    arity: u8,
}

#[derive(Debug, Clone)]
struct SymbolEntry {
    name: String,
    symbol: Symbol,
}

/// The symbol table of a problem.
///
/// Interning is get-or-create: the same (name, kind, arity) always yields the
/// same symbol.
#[derive(Debug, Clone)]
pub struct Signature {
    entries: Vec<SymbolEntry>,
    lookup: HashMap<SymbolKey, SymbolId>,
    by_name: HashMap<String, Vec<SymbolId>>,
    banks: u16,
}

impl Default for Signature {
    fn default() -> Self {
        Self::new()
    }
}

impl Signature {
    /// Create a signature holding only the reserved symbols
    pub fn new() -> Self {
        let mut signature = Signature {
            entries: Vec::new(),
            lookup: HashMap::new(),
            by_name: HashMap::new(),
            banks: 0,
        };
        signature.reserve("=", SymbolKind::Predicate, 2);
        for connective in Connective::ALL {
            let symbol = connective.symbol();
            signature.reserve(connective.name(), symbol.kind, symbol.arity);
        }
        for quantifier in Quantifier::ALL {
            signature.reserve(quantifier.name(), SymbolKind::Quantifier, 1);
        }
        signature
    }

    fn reserve(&mut self, name: &str, kind: SymbolKind, arity: u8) {
        let symbol = self.intern(name, kind, arity);
        debug_assert_eq!(symbol.id.0 as usize + 1, self.entries.len());
    }

    fn intern(&mut self, name: &str, kind: SymbolKind, arity: u8) -> Symbol {
        let key = SymbolKey {
            name: name.to_string(),
            kind,
            arity,
        };
        if let Some(&id) = self.lookup.get(&key) {
            return self.entries[id.0 as usize].symbol;
        }
        let id = SymbolId(self.entries.len() as u32);
        let symbol = Symbol { id, kind, arity };
        self.entries.push(SymbolEntry {
            name: key.name.clone(),
            symbol,
        });
        self.by_name.entry(key.name.clone()).or_default().push(id);
        self.lookup.insert(key, id);
        symbol
    }

    /// Intern an individual constant
    pub fn intern_constant(&mut self, name: &str) -> Symbol {
        self.intern(name, SymbolKind::IndividualConstant, 0)
    }

    /// Intern a function symbol. Arity zero interns a constant instead.
    pub fn intern_function(&mut self, name: &str, arity: u8) -> Symbol {
        if arity == 0 {
            return self.intern_constant(name);
        }
        self.intern(name, SymbolKind::Function, arity)
    }

    /// Intern a predicate symbol
    pub fn intern_predicate(&mut self, name: &str, arity: u8) -> Symbol {
        if name == "=" && arity == 2 {
            return self.equality();
        }
        self.intern(name, SymbolKind::Predicate, arity)
    }

    /// The reserved equality predicate
    pub fn equality(&self) -> Symbol {
        self.entries[SymbolId::EQUALITY.0 as usize].symbol
    }

    /// Look up a symbol by id
    pub fn symbol(&self, id: SymbolId) -> Symbol {
        self.entries[id.0 as usize].symbol
    }

    /// Resolve a symbol id to its name
    pub fn resolve(&self, id: SymbolId) -> &str {
        &self.entries[id.0 as usize].name
    }

    /// All symbols sharing a name (any kind, any arity)
    pub fn lookup_name(&self, name: &str) -> &[SymbolId] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of symbols, reserved ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Open a new variable bank
    pub fn new_bank(&mut self) -> VariableBank {
        let id = BankId(self.banks);
        self.banks += 1;
        VariableBank { id, next: 0 }
    }
}
