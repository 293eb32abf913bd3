//! Random term generators shared by the property tests

use crate::logic::core::term::Term;
use crate::logic::interner::{Signature, VariableBank};
use proptest::prelude::*;

/// Term description before interning
#[derive(Debug, Clone)]
pub enum TermDesc {
    Var(u8),
    Const(u8),
    Func(u8, Vec<TermDesc>),
}

/// Terms over X0..X3, c0..c3 and f0, f1 of arity one or two
pub fn arb_term_desc(max_depth: u32) -> BoxedStrategy<TermDesc> {
    if max_depth == 0 {
        prop_oneof![
            (0..4u8).prop_map(TermDesc::Var),
            (0..4u8).prop_map(TermDesc::Const),
        ]
        .boxed()
    } else {
        prop_oneof![
            3 => (0..4u8).prop_map(TermDesc::Var),
            3 => (0..4u8).prop_map(TermDesc::Const),
            2 => (0..2u8, proptest::collection::vec(arb_term_desc(max_depth - 1), 1..=2))
                .prop_map(|(f, args)| TermDesc::Func(f, args)),
        ]
        .boxed()
    }
}

pub fn arb_ground_term_desc(max_depth: u32) -> BoxedStrategy<TermDesc> {
    if max_depth == 0 {
        (0..4u8).prop_map(TermDesc::Const).boxed()
    } else {
        prop_oneof![
            3 => (0..4u8).prop_map(TermDesc::Const),
            2 => (0..2u8, proptest::collection::vec(arb_ground_term_desc(max_depth - 1), 1..=2))
                .prop_map(|(f, args)| TermDesc::Func(f, args)),
        ]
        .boxed()
    }
}

/// Interns described terms into one signature, with two variable banks
pub struct TermBuilder {
    pub sig: Signature,
    pub banks: [VariableBank; 2],
}

impl TermBuilder {
    pub fn new() -> Self {
        let mut sig = Signature::new();
        let banks = [sig.new_bank(), sig.new_bank()];
        TermBuilder { sig, banks }
    }

    /// Build with variables from the first bank
    pub fn build(&mut self, desc: &TermDesc) -> Term {
        self.build_in(desc, 0)
    }

    pub fn build_in(&mut self, desc: &TermDesc, bank: usize) -> Term {
        match desc {
            TermDesc::Var(i) => Term::Variable(self.banks[bank].get(*i as u32)),
            TermDesc::Const(i) => Term::Constant(self.sig.intern_constant(&format!("c{}", i))),
            TermDesc::Func(f, args) => {
                let symbol = self.sig.intern_function(&format!("f{}", f), args.len() as u8);
                let built = args.iter().map(|a| self.build_in(a, bank)).collect();
                Term::function(symbol, built)
            }
        }
    }
}
