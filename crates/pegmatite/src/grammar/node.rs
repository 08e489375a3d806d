//! The rule node sum type.
//!
//! Every rule kind — terminal, combinator, or semantic — is one variant of
//! [`RuleNode`]. Nodes are immutable after construction; the only exception
//! is [`RefNode`], whose body is assigned exactly once through
//! [`Ref::set`](crate::Ref::set). The `Display` impl renders the PEG
//! notation used by the debug tracer and by [`print`](crate::print).

use crate::value::{Value, Values};
use hashbrown::HashMap;
use std::cell::{Cell, OnceCell};
use std::fmt;

use super::Rule;

pub(crate) type RunePredFn = Box<dyn Fn(char) -> bool>;
pub(crate) type ScanFn = Box<dyn Fn(&str) -> Option<usize>>;
pub(crate) type ActionFn = Box<dyn Fn(&Values) -> Option<Value>>;
pub(crate) type TransformFn = Box<dyn Fn(&str) -> Option<Value>>;
pub(crate) type BuildFn = Box<dyn Fn(&Values) -> Value>;
pub(crate) type PredicateFn = Box<dyn Fn(&Values) -> bool>;

/// Callback given to [`many`](crate::many): receives one collected value per
/// successful iteration (in order, `None` for iterations that produced no
/// value) and returns the value of the whole repetition.
///
/// The slice is a pooled buffer that is reused once the callback returns;
/// copy out anything that needs to live longer.
pub type CollectFn = Box<dyn Fn(&[Option<Value>]) -> Option<Value>>;

/// A forward-declarable, memoized reference. See [`Ref`](crate::Ref).
pub(crate) struct RefNode {
    pub(crate) name: &'static str,
    pub(crate) body: OnceCell<Rule>,
    pub(crate) left_rec: Cell<bool>,
}

pub(crate) enum RuleNode {
    // Terminals
    Any,
    Eos,
    Lit(Box<str>),
    Lit1(u8),
    Lit2([u8; 2]),
    CharRange {
        start: char,
        end: char,
    },
    CharSet(Box<[char]>),
    RunePred(RunePredFn),
    Regex {
        pattern: Box<str>,
        re: regex::Regex,
    },
    Scan(ScanFn),
    PrefixTable(HashMap<u8, Rule, ahash::RandomState>),
    NotByte(u8),

    // Combinators
    Choice(Box<[Rule]>),
    Either(Rule, Rule),
    Seq(Box<[Rule]>),
    Both(Rule, Rule),
    Three(Rule, Rule, Rule),
    Star(Rule),
    Plus(Rule),
    Many {
        rule: Rule,
        min: usize,
        max: Option<usize>,
        collect: Option<CollectFn>,
    },
    Maybe(Rule),
    Check(Rule),
    Not(Rule),

    // Semantic rules
    Ref(RefNode),
    Scope(Rule),
    Named {
        name: &'static str,
        rule: Rule,
    },
    Action {
        rule: Rule,
        action: ActionFn,
    },
    Transform {
        rule: Rule,
        transform: TransformFn,
    },
    Capture(Rule),
    Apply {
        rule: Rule,
        record: &'static str,
        build: BuildFn,
    },
    CheckAction(PredicateFn),
    Label {
        label: &'static str,
        rule: Rule,
    },
}

/// Parenthesizes choice and sequence children of postfix operators.
fn parenthesized(rule: &Rule) -> String {
    match rule.node() {
        RuleNode::Choice(_)
        | RuleNode::Either(..)
        | RuleNode::Seq(_)
        | RuleNode::Both(..)
        | RuleNode::Three(..) => format!("({rule})"),
        _ => rule.to_string(),
    }
}

fn join(rules: &[&Rule], sep: &str) -> String {
    rules
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

impl fmt::Display for RuleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("."),
            Self::Eos => f.write_str("EOF"),
            Self::Lit(s) => write!(f, "{s:?}"),
            Self::Lit1(b) => write!(f, "{:?}", (*b as char).to_string()),
            Self::Lit2([a, b]) => {
                write!(f, "{:?}", String::from_utf8_lossy(&[*a, *b]))
            }
            Self::CharRange { start, end } => write!(f, "[{start}-{end}]"),
            Self::CharSet(set) => {
                let runes: Vec<String> = set.iter().map(|c| c.to_string()).collect();
                write!(f, "{{{}}}", runes.join(","))
            }
            Self::RunePred(_) => f.write_str("<rune-fn>"),
            Self::Regex { pattern, .. } => write!(f, "/{pattern}/"),
            Self::Scan(_) => f.write_str(":<scan>"),
            Self::PrefixTable(table) => {
                let subs: Vec<String> = table.values().map(|r| r.to_string()).collect();
                f.write_str(&subs.join(" | "))
            }
            Self::NotByte(b) => write!(f, "!{:?}", (*b as char).to_string()),
            Self::Choice(rules) => {
                f.write_str(&join(&rules.iter().collect::<Vec<_>>(), " | "))
            }
            Self::Either(a, b) => write!(f, "{a} | {b}"),
            Self::Seq(rules) => f.write_str(&join(&rules.iter().collect::<Vec<_>>(), " ")),
            Self::Both(a, b) => write!(f, "{a} {b}"),
            Self::Three(a, b, c) => write!(f, "{a} {b} {c}"),
            Self::Star(rule) => write!(f, "{}*", parenthesized(rule)),
            Self::Plus(rule) => write!(f, "{}+", parenthesized(rule)),
            Self::Many { rule, min, max, .. } => match max {
                Some(max) => write!(f, "{}{{{min},{max}}}", parenthesized(rule)),
                None => write!(f, "{}{{{min},}}", parenthesized(rule)),
            },
            Self::Maybe(rule) => write!(f, "{rule}?"),
            Self::Check(rule) => write!(f, "&{rule}"),
            Self::Not(rule) => write!(f, "!{rule}"),
            Self::Ref(node) => f.write_str(node.name),
            Self::Scope(rule) => write!(f, "{rule}"),
            Self::Named { name, rule } => write!(f, "{rule}:{name}"),
            Self::Action { rule, .. } => write!(f, "{rule}"),
            Self::Transform { rule, .. } => write!(f, "{rule}"),
            Self::Capture(rule) => write!(f, "< {rule} >"),
            Self::Apply { rule, .. } => write!(f, "{rule}"),
            Self::CheckAction(_) => f.write_str("&<fn>"),
            Self::Label { rule, .. } => write!(f, "{rule}"),
        }
    }
}
