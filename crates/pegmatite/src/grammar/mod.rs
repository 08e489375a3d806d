//! Grammar construction: rule handles, constructors, references, and
//! left-recursion analysis.
//!
//! Grammars are built programmatically: each constructor returns an opaque
//! [`Rule`] handle over an immutable node. Handles are cheap to clone and a
//! grammar is an arbitrary (possibly cyclic, via [`Ref`]) graph of them.

pub(crate) mod analysis;
mod build;
mod labels;
pub(crate) mod node;

pub use build::*;
pub use labels::{BranchesBuilder, Labels, branches, refs};
pub use node::CollectFn;

use analysis::{RuleSet, detect_left_rec};
use node::{RefNode, RuleNode};
use std::fmt;
use std::rc::Rc;

/// Pointer identity of a rule node, used as memo key and in the
/// left-recursion detector's visited set.
pub(crate) type RuleKey = usize;

/// An opaque handle to a grammar rule.
///
/// Rules are created with the constructor functions in this crate
/// ([`s`], [`or`], [`seq`], [`star`], ...) and matched against input with a
/// [`Parser`](crate::Parser). Cloning a `Rule` shares the underlying node.
#[derive(Clone)]
pub struct Rule(Rc<RuleNode>);

impl Rule {
    pub(crate) fn make(node: RuleNode) -> Self {
        Self(Rc::new(node))
    }

    pub(crate) fn node(&self) -> &RuleNode {
        &self.0
    }

    pub(crate) fn key(&self) -> RuleKey {
        Rc::as_ptr(&self.0) as usize
    }

    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.node(), f)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rule({self})")
    }
}

impl From<&Rule> for Rule {
    fn from(rule: &Rule) -> Self {
        rule.clone()
    }
}

/// Render a rule as PEG notation.
pub fn print(rule: &Rule) -> String {
    rule.to_string()
}

/// A named reference to a rule, created with [`r`].
///
/// References enable recursion: a `Ref` is created unbound, used inside
/// other rules, and bound exactly once with [`Ref::set`]. Matching a
/// reference is memoized by `(position, reference)`, the packrat technique
/// that tames backtracking to linear time; binding runs a one-shot detector
/// so that directly left-recursive references are matched with seed growth.
///
/// Binding twice, or matching before binding, is a programmer error and
/// panics.
#[derive(Clone)]
pub struct Ref(Rule);

impl Ref {
    /// The `Rule` handle for this reference, for embedding in other rules.
    pub fn rule(&self) -> Rule {
        self.0.clone()
    }

    fn node(&self) -> &RefNode {
        match self.0.node() {
            RuleNode::Ref(node) => node,
            _ => unreachable!("Ref handle over a non-reference node"),
        }
    }

    /// Bind the reference to its body. Panics if already bound.
    pub fn set(&self, body: impl Into<Rule>) {
        let body = body.into();
        let node = self.node();

        let left_rec = if body.ptr_eq(&self.0) {
            true
        } else {
            let mut visited = RuleSet::default();
            visited.insert(body.key());
            detect_left_rec(body.node(), &self.0, &mut visited)
        };

        if node.body.set(body).is_err() {
            panic!("reference {:?} bound twice", node.name);
        }
        node.left_rec.set(left_rec);
    }

    /// Whether the bound body refers back to this reference in left-most
    /// position, which selects the seed-growth matching strategy.
    pub fn left_recursive(&self) -> bool {
        self.node().left_rec.get()
    }

    pub fn name(&self) -> &'static str {
        self.node().name
    }
}

impl From<Ref> for Rule {
    fn from(reference: Ref) -> Self {
        reference.0
    }
}

impl From<&Ref> for Rule {
    fn from(reference: &Ref) -> Self {
        reference.rule()
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ref({})", self.name())
    }
}
