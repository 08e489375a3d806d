//! Left-recursion detection, run once when a reference is bound.
//!
//! The detector walks the left-most position of the bound body: a node is
//! explored only where it could be entered without consuming input first.
//! When the target reference is reachable that way, the reference is
//! flagged left-recursive and matched with seed growth instead of plain
//! memoization. Indirect (mutual) left recursion is out of scope.

use super::Rule;
use super::node::RuleNode;
use hashbrown::HashSet;

pub(crate) type RuleSet = HashSet<super::RuleKey, ahash::RandomState>;

/// Walks one already-visited node. The visited set cuts cycles: a sub-rule
/// seen twice ends the walk along that path.
pub(crate) fn detect_left_rec(node: &RuleNode, target: &Rule, visited: &mut RuleSet) -> bool {
    match node {
        // Terminals consume input or inspect the stream directly.
        RuleNode::Any
        | RuleNode::Eos
        | RuleNode::Lit(_)
        | RuleNode::Lit1(_)
        | RuleNode::Lit2(_)
        | RuleNode::CharRange { .. }
        | RuleNode::CharSet(_)
        | RuleNode::RunePred(_)
        | RuleNode::Regex { .. }
        | RuleNode::Scan(_)
        | RuleNode::NotByte(_)
        | RuleNode::CheckAction(_) => false,

        // Every alternative starts at the entry position.
        RuleNode::Either(a, b) => detect_in_all([a, b], target, visited),
        RuleNode::Choice(rules) => detect_in_all(rules.iter(), target, visited),
        RuleNode::PrefixTable(table) => detect_in_all(table.values(), target, visited),

        // Only the first element of a sequence is reachable without
        // consuming input.
        RuleNode::Both(first, _) | RuleNode::Three(first, _, _) => {
            detect_in_sub(first, target, visited)
        }
        RuleNode::Seq(rules) => match rules.first() {
            Some(first) => detect_in_sub(first, target, visited),
            None => false,
        },

        // Single-child wrappers enter their child at the entry position.
        RuleNode::Star(rule)
        | RuleNode::Plus(rule)
        | RuleNode::Many { rule, .. }
        | RuleNode::Maybe(rule)
        | RuleNode::Check(rule)
        | RuleNode::Not(rule)
        | RuleNode::Scope(rule)
        | RuleNode::Named { rule, .. }
        | RuleNode::Action { rule, .. }
        | RuleNode::Transform { rule, .. }
        | RuleNode::Capture(rule)
        | RuleNode::Apply { rule, .. }
        | RuleNode::Label { rule, .. } => detect_in_sub(rule, target, visited),

        RuleNode::Ref(node) => match node.body.get() {
            Some(body) => detect_in_sub(body, target, visited),
            None => false,
        },
    }
}

fn detect_in_sub(sub: &Rule, target: &Rule, visited: &mut RuleSet) -> bool {
    if !visited.insert(sub.key()) {
        return false;
    }
    sub.ptr_eq(target) || detect_left_rec(sub.node(), target, visited)
}

fn detect_in_all<'a>(
    subs: impl IntoIterator<Item = &'a Rule>,
    target: &Rule,
    visited: &mut RuleSet,
) -> bool {
    for sub in subs {
        if !visited.insert(sub.key()) {
            return false;
        }
        if sub.ptr_eq(target) || detect_left_rec(sub.node(), target, visited) {
            return true;
        }
    }
    false
}
