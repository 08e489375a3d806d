//! Named-reference registry and the self-referencing choice builder.

use super::node::RuleNode;
use super::{Ref, Rule, or, r};
use hashbrown::HashMap;

/// A small database of named references, so rule sets can be wired up
/// without threading `Ref` handles around by hand.
pub struct Labels {
    refs: HashMap<&'static str, Ref, ahash::RandomState>,
}

/// Creates an empty [`Labels`] registry.
pub fn refs() -> Labels {
    Labels {
        refs: HashMap::default(),
    }
}

impl Labels {
    /// Returns the rule for `name`, creating an unbound reference on first
    /// use.
    pub fn rule(&mut self, name: &'static str) -> Rule {
        self.refs.entry(name).or_insert_with(|| r(name)).rule()
    }

    /// Binds `name` to `body`, creating the reference if needed, and
    /// returns it.
    pub fn set(&mut self, name: &'static str, body: impl Into<Rule>) -> Ref {
        let reference = self.refs.entry(name).or_insert_with(|| r(name)).clone();
        reference.set(body);
        reference
    }
}

/// Registers the alternatives of a [`branches`] rule.
#[derive(Default)]
pub struct BranchesBuilder {
    alternatives: Vec<Rule>,
}

impl BranchesBuilder {
    /// Adds an alternative under a diagnostic label. Alternatives are tried
    /// in registration order.
    pub fn add(&mut self, label: &'static str, rule: impl Into<Rule>) {
        self.alternatives.push(Rule::make(RuleNode::Label {
            label,
            rule: rule.into(),
        }));
    }
}

/// Builds a named, self-referencing ordered choice.
///
/// `build` receives a [`BranchesBuilder`] and the rule for the enclosing
/// reference, so alternatives can refer back to the whole choice; left-
/// recursive alternatives work via the reference's seed-growth matching.
/// This is the idiomatic way to express operator precedence:
///
/// ```
/// use pegmatite::{Parser, branches, capture, re, seq};
///
/// let num = capture(re("[0-9]+"));
/// let product = branches("product", |bb, this| {
///     bb.add("mul", seq([this.clone(), pegmatite::s("*"), num.clone()]));
///     bb.add("num", num.clone());
/// });
/// assert!(Parser::new().parse(&product, "1*2*3").matched);
/// ```
pub fn branches(
    name: &'static str,
    build: impl FnOnce(&mut BranchesBuilder, &Rule),
) -> Rule {
    let reference = r(name);
    let this = reference.rule();
    let mut builder = BranchesBuilder::default();
    build(&mut builder, &this);
    reference.set(or(builder.alternatives));
    this
}
