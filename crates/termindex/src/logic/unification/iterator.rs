//! Backtrackable flatterm iterators
//!
//! Both iterators walk a subterm in prefix order and can skip the arguments of
//! the symbol just visited. Every `next` and `skip_arguments` call pushes a
//! resumption point, so the walk can be rewound one step at a time or back to
//! a saved [`IterSavepoint`].

use super::substitution::UnifierSubstitution;
use crate::logic::flatterm::{Flatterm, Subterm};
use std::rc::Rc;

/// Number of resumption points recorded by an iterator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IterSavepoint(usize);

impl IterSavepoint {
    /// The state right after `reset`
    pub const ORIGIN: IterSavepoint = IterSavepoint(0);
}

// =============================================================================
// Plain iterator
// =============================================================================

/// Walks the cells of one subterm.
#[derive(Debug, Clone, Default)]
pub struct FlatIterator {
    term: Option<Rc<Flatterm>>,
    pos: usize,
    end: usize,
    trail: Vec<usize>,
}

impl FlatIterator {
    pub fn new(start: &Subterm) -> Self {
        let mut iter = FlatIterator::default();
        iter.reset(start);
        iter
    }

    pub fn reset(&mut self, start: &Subterm) {
        self.term = Some(start.flatterm().clone());
        self.pos = start.pos();
        self.end = start.end();
        self.trail.clear();
    }

    /// Forget the term and all resumption points
    pub fn clear(&mut self) {
        self.term = None;
        self.pos = 0;
        self.end = 0;
        self.trail.clear();
    }

    pub fn has_next(&self) -> bool {
        self.pos < self.end
    }

    /// The subterm at the current position, without advancing
    pub fn peek(&self) -> Option<Subterm> {
        let term = self.term.as_ref()?;
        self.has_next().then(|| Subterm::at(term.clone(), self.pos))
    }

    /// Visit the next cell
    pub fn next(&mut self) -> Option<Subterm> {
        let current = self.peek()?;
        self.trail.push(self.pos);
        self.pos += 1;
        Some(current)
    }

    /// Skip the arguments of the cell returned by the last `next`
    pub fn skip_arguments(&mut self) {
        let Some(term) = &self.term else { return };
        debug_assert!(self.pos > 0);
        let visited = self.pos - 1;
        self.trail.push(self.pos);
        self.pos = term.after(visited);
    }

    pub fn savepoint(&self) -> IterSavepoint {
        IterSavepoint(self.trail.len())
    }

    /// Undo the last `next` or `skip_arguments`
    pub fn backtrack(&mut self) -> bool {
        match self.trail.pop() {
            Some(pos) => {
                self.pos = pos;
                true
            }
            None => false,
        }
    }

    pub fn backtrack_to(&mut self, savepoint: IterSavepoint) {
        while self.trail.len() > savepoint.0 {
            self.backtrack();
        }
    }
}

// =============================================================================
// Instance iterator
// =============================================================================

#[derive(Debug, Clone)]
struct Frame {
    term: Rc<Flatterm>,
    pos: usize,
    end: usize,
}

#[derive(Debug, Clone)]
enum Undo {
    /// Restore the position of the frame at this depth
    Advance { level: usize, pos: usize },
    /// Drop the frame pushed when entering a variable's instance
    Deepen,
    /// Push back a finished frame popped on the way out of an instance
    Resurface(Frame),
}

/// Walks a subterm as if every bound variable of the unifier ledger had been
/// replaced by its instance.
///
/// Entering the instance of a bound variable pushes a frame. Leaving one or
/// more finished instances happens in a single step at the start of the next
/// `next` call.
#[derive(Debug, Clone, Default)]
pub struct InstanceIterator {
    frames: Vec<Frame>,
    log: Vec<Undo>,
    // log length at the start of each step
    steps: Vec<usize>,
}

impl InstanceIterator {
    pub fn new(start: &Subterm) -> Self {
        let mut iter = InstanceIterator::default();
        iter.reset(start);
        iter
    }

    pub fn reset(&mut self, start: &Subterm) {
        self.clear();
        self.frames.push(Frame {
            term: start.flatterm().clone(),
            pos: start.pos(),
            end: start.end(),
        });
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.log.clear();
        self.steps.clear();
    }

    /// Number of instances currently entered
    pub fn depth(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    pub fn has_next(&self) -> bool {
        self.frames.iter().any(|f| f.pos < f.end)
    }

    /// The dereferenced subterm `next` would visit
    pub fn peek(&self, subst: &UnifierSubstitution) -> Option<Subterm> {
        let frame = self.frames.iter().rev().find(|f| f.pos < f.end)?;
        Some(subst.deref(&Subterm::at(frame.term.clone(), frame.pos)))
    }

    /// Visit the next symbol of the instance.
    ///
    /// Returns the dereferenced subterm starting there: for a bound variable
    /// that is the head of its instance, which is entered.
    pub fn next(&mut self, subst: &UnifierSubstitution) -> Option<Subterm> {
        if !self.has_next() {
            return None;
        }
        self.steps.push(self.log.len());
        while let Some(top) = self.frames.last() {
            if top.pos < top.end {
                break;
            }
            if let Some(finished) = self.frames.pop() {
                self.log.push(Undo::Resurface(finished));
            }
        }
        let level = self.frames.len() - 1;
        let top = &mut self.frames[level];
        let here = Subterm::at(top.term.clone(), top.pos);
        self.log.push(Undo::Advance {
            level,
            pos: top.pos,
        });
        top.pos += 1;

        let target = subst.deref(&here);
        if target.is_same(&here) {
            return Some(here);
        }
        self.log.push(Undo::Deepen);
        self.frames.push(Frame {
            term: target.flatterm().clone(),
            pos: target.pos() + 1,
            end: target.end(),
        });
        Some(target)
    }

    /// Skip the arguments of the symbol returned by the last `next`
    pub fn skip_arguments(&mut self) {
        let Some(level) = self.frames.len().checked_sub(1) else {
            return;
        };
        let top = &mut self.frames[level];
        debug_assert!(top.pos > 0);
        self.steps.push(self.log.len());
        self.log.push(Undo::Advance {
            level,
            pos: top.pos,
        });
        top.pos = top.term.after(top.pos - 1);
    }

    pub fn savepoint(&self) -> IterSavepoint {
        IterSavepoint(self.steps.len())
    }

    /// Undo the last `next` or `skip_arguments`
    pub fn backtrack(&mut self) -> bool {
        let Some(start) = self.steps.pop() else {
            return false;
        };
        while self.log.len() > start {
            match self.log.pop() {
                Some(Undo::Advance { level, pos }) => self.frames[level].pos = pos,
                Some(Undo::Deepen) => {
                    self.frames.pop();
                }
                Some(Undo::Resurface(frame)) => self.frames.push(frame),
                None => break,
            }
        }
        true
    }

    pub fn backtrack_to(&mut self, savepoint: IterSavepoint) {
        while self.steps.len() > savepoint.0 {
            self.backtrack();
        }
    }
}
