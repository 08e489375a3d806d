//! Rule constructors.
//!
//! These free functions are the public grammar-building surface. Several of
//! them pick a specialized node behind the scenes: one- and two-byte
//! literals compare bytes directly, two-alternative choices and two- or
//! three-element sequences skip the general loop, and `not` over a
//! single-byte literal becomes a byte peek.

use super::node::{CollectFn, RefNode, RuleNode};
use super::{Ref, Rule};
use crate::value::{Record, RuleValue, Value, Values};
use hashbrown::HashMap;
use std::cell::{Cell, OnceCell};

/// Matches any single code point; fails only at end of input.
///
/// The value of the match is nil.
pub fn any() -> Rule {
    Rule::make(RuleNode::Any)
}

/// Matches only when the input stream is exhausted. Never advances.
///
/// The value of the match is nil.
pub fn eos() -> Rule {
    Rule::make(RuleNode::Eos)
}

/// Matches a literal string exactly.
///
/// The value of the match is nil.
pub fn s(lit: impl Into<String>) -> Rule {
    let lit = lit.into();
    let bytes = lit.as_bytes();
    match bytes.len() {
        1 => Rule::make(RuleNode::Lit1(bytes[0])),
        2 => Rule::make(RuleNode::Lit2([bytes[0], bytes[1]])),
        _ => Rule::make(RuleNode::Lit(lit.into_boxed_str())),
    }
}

/// Matches one code point between `start` and `end` inclusive, like the
/// regexp class `[a-z]` but without regexp machinery.
///
/// The value of the match is nil.
pub fn range(start: char, end: char) -> Rule {
    Rule::make(RuleNode::CharRange { start, end })
}

/// Matches one code point equal to any of the given runes, like the regexp
/// class `[abc]` but without regexp machinery.
///
/// The value of the match is nil.
pub fn set(runes: impl IntoIterator<Item = char>) -> Rule {
    Rule::make(RuleNode::CharSet(runes.into_iter().collect()))
}

/// Matches one code point satisfying the predicate.
///
/// The value of the match is nil.
pub fn rune(pred: impl Fn(char) -> bool + 'static) -> Rule {
    Rule::make(RuleNode::RunePred(Box::new(pred)))
}

/// Matches a regular expression anchored at the current position (as if the
/// pattern began with `\A`); the input is never searched.
///
/// Panics if the pattern is invalid.
///
/// The value of the match is nil.
pub fn re(pattern: &str) -> Rule {
    let anchored = format!(r"\A(?:{pattern})");
    let compiled = match regex::Regex::new(&anchored) {
        Ok(re) => re,
        Err(err) => panic!("invalid regex {pattern:?}: {err}"),
    };
    Rule::make(RuleNode::Regex {
        pattern: pattern.into(),
        re: compiled,
    })
}

/// Manual optimization rule: calls `f` with the remaining input and consumes
/// the returned number of bytes, failing on `None`. Lets callers hand-write
/// fast inner loops for hot terminals.
///
/// The value of the match is nil.
pub fn scan(f: impl Fn(&str) -> Option<usize> + 'static) -> Rule {
    Rule::make(RuleNode::Scan(Box::new(f)))
}

/// Manual optimization rule: peeks one byte and delegates to the rule mapped
/// to it, failing without consuming when the byte has no entry. Equivalent
/// to a large ordered choice whose alternatives have distinct fixed one-byte
/// prefixes.
///
/// Keys must be single-byte characters; a wider key panics.
///
/// The value of the match is the value of the delegated rule.
pub fn prefix_table(entries: impl IntoIterator<Item = (char, Rule)>) -> Rule {
    let mut table: HashMap<u8, Rule, ahash::RandomState> = HashMap::default();
    for (key, rule) in entries {
        let mut buf = [0u8; 4];
        let encoded = key.encode_utf8(&mut buf).as_bytes();
        if encoded.len() != 1 {
            panic!("prefix table key {key:?} is wider than one byte");
        }
        table.insert(encoded[0], rule);
    }
    Rule::make(RuleNode::PrefixTable(table))
}

/// Matches when the current byte differs from `byte`, without advancing.
/// The byte-peeking equivalent of `not(s(...))` for one-byte literals.
///
/// The value of the match is nil.
pub fn not_byte(byte: u8) -> Rule {
    Rule::make(RuleNode::NotByte(byte))
}

/// Ordered choice: tries each rule in order and commits to the first match.
/// Alternatives after a success are never tried.
///
/// The value of the match is the value of the matching alternative.
pub fn or(rules: impl IntoIterator<Item = Rule>) -> Rule {
    let mut rules: Vec<Rule> = rules.into_iter().collect();
    match rules.len() {
        1 => rules.pop().expect("length checked"),
        2 => {
            let b = rules.pop().expect("length checked");
            let a = rules.pop().expect("length checked");
            Rule::make(RuleNode::Either(a, b))
        }
        _ => Rule::make(RuleNode::Choice(rules.into_boxed_slice())),
    }
}

/// Matches each rule in order; fails (restoring the entry position) when any
/// of them fails.
///
/// The value of the match is the value of the right-most sub-rule that
/// produced one.
pub fn seq(rules: impl IntoIterator<Item = Rule>) -> Rule {
    let mut rules: Vec<Rule> = rules.into_iter().collect();
    match rules.len() {
        1 => rules.pop().expect("length checked"),
        2 => {
            let b = rules.pop().expect("length checked");
            let a = rules.pop().expect("length checked");
            Rule::make(RuleNode::Both(a, b))
        }
        3 => {
            let c = rules.pop().expect("length checked");
            let b = rules.pop().expect("length checked");
            let a = rules.pop().expect("length checked");
            Rule::make(RuleNode::Three(a, b, c))
        }
        _ => Rule::make(RuleNode::Seq(rules.into_boxed_slice())),
    }
}

/// Zero or more matches of `rule`; never fails.
///
/// The value of the match is the value of the last successful iteration,
/// nil when there were none.
pub fn star(rule: impl Into<Rule>) -> Rule {
    Rule::make(RuleNode::Star(rule.into()))
}

/// One or more matches of `rule`; fails when the first attempt fails.
///
/// The value of the match is the value of the last successful iteration.
pub fn plus(rule: impl Into<Rule>) -> Rule {
    Rule::make(RuleNode::Plus(rule.into()))
}

/// Bounded repetition: between `min` and `max` matches of `rule`
/// (`max = None` for unbounded). When at least `min` iterations succeed,
/// `collect` (if given) receives the per-iteration values and its return
/// becomes the value of the match; the slice it borrows is reused after it
/// returns.
pub fn many(
    rule: impl Into<Rule>,
    min: usize,
    max: Option<usize>,
    collect: Option<CollectFn>,
) -> Rule {
    Rule::make(RuleNode::Many {
        rule: rule.into(),
        min,
        max,
        collect,
    })
}

/// Matches `rule` if possible, succeeding either way.
///
/// The value of the match is whatever `rule` produced (possibly nil).
pub fn maybe(rule: impl Into<Rule>) -> Rule {
    Rule::make(RuleNode::Maybe(rule.into()))
}

/// And-predicate: matches when `rule` matches, without consuming input.
///
/// The value of the match is the value of `rule`.
pub fn check(rule: impl Into<Rule>) -> Rule {
    Rule::make(RuleNode::Check(rule.into()))
}

/// Not-predicate: matches when `rule` does not match, without consuming
/// input. Fails at end of input.
///
/// The value of the match is nil.
pub fn not(rule: impl Into<Rule>) -> Rule {
    let rule = rule.into();
    if let RuleNode::Lit1(byte) = rule.node() {
        return not_byte(*byte);
    }
    Rule::make(RuleNode::Not(rule))
}

/// Creates an unbound reference. See [`Ref`].
pub fn r(name: &'static str) -> Ref {
    Ref::unbound(name)
}

impl Ref {
    pub(crate) fn unbound(name: &'static str) -> Self {
        Self::from_rule(Rule::make(RuleNode::Ref(RefNode {
            name,
            body: OnceCell::new(),
            left_rec: Cell::new(false),
        })))
    }

    pub(crate) fn from_rule(rule: Rule) -> Self {
        debug_assert!(matches!(rule.node(), RuleNode::Ref(_)));
        // Ref is a transparent handle over the same node.
        Self(rule)
    }
}

/// Memoizes `rule`: matching records the result by input position so that
/// repeated attempts at the same position are replayed from the cache.
/// Shorthand for binding an anonymous reference.
///
/// The value of the match is the value of `rule`.
pub fn memo(rule: impl Into<Rule>) -> Rule {
    let reference = r("");
    reference.set(rule);
    reference.rule()
}

/// Introduces a fresh value scope around `rule`. Rarely needed directly:
/// [`action`] and [`apply`] scope themselves.
///
/// The value of the match is the value of `rule`.
pub fn scope(rule: impl Into<Rule>) -> Rule {
    Rule::make(RuleNode::Scope(rule.into()))
}

/// Stores the value of `rule` under `name` in the current scope when it
/// matches, for consumption by an enclosing [`action`], [`apply`], or
/// [`check_action`].
///
/// The value of the match is the value of `rule`.
pub fn named(name: &'static str, rule: impl Into<Rule>) -> Rule {
    Rule::make(RuleNode::Named {
        name,
        rule: rule.into(),
    })
}

/// Calls `f` with the scope of named values when `rule` matches; the return
/// becomes the value of the match. A fresh scope surrounds the whole rule.
/// The produced value's [`set_position`](RuleValue::set_position) hook is
/// invoked with the matched span.
pub fn action(rule: impl Into<Rule>, f: impl Fn(&Values) -> Option<Value> + 'static) -> Rule {
    scope(Rule::make(RuleNode::Action {
        rule: rule.into(),
        action: Box::new(f),
    }))
}

/// Calls `f` with the matched slice of input when `rule` matches; the
/// return becomes the value of the match, and its
/// [`set_position`](RuleValue::set_position) hook is invoked.
pub fn transform(rule: impl Into<Rule>, f: impl Fn(&str) -> Option<Value> + 'static) -> Rule {
    Rule::make(RuleNode::Transform {
        rule: rule.into(),
        transform: Box::new(f),
    })
}

/// Pulls the matched text up as the value: when `rule` matches, the value
/// of the match is the matched slice of input as a `String`.
pub fn capture(rule: impl Into<Rule>) -> Rule {
    Rule::make(RuleNode::Capture(rule.into()))
}

/// Builds a `T` from the scope when `rule` matches: each field listed by
/// [`Record::FIELDS`] whose scope key is present is assigned; the rest keep
/// their defaults. A fresh scope surrounds the whole rule, and the new
/// record's [`set_position`](RuleValue::set_position) hook is invoked.
///
/// The value of the match is the populated record.
pub fn apply<T: Record + RuleValue>(rule: impl Into<Rule>) -> Rule {
    let build = Box::new(|values: &Values| {
        let mut record = T::default();
        for field in T::FIELDS {
            if let Some(value) = values.get(field.name) {
                (field.assign)(&mut record, value);
            }
        }
        Value::new(record)
    });
    scope(Rule::make(RuleNode::Apply {
        rule: rule.into(),
        record: std::any::type_name::<T>(),
        build,
    }))
}

/// Evaluates `f` against the current scope: matches (consuming nothing)
/// when it returns true. The combinator equivalent of `&{ ... }` semantic
/// guards in other PEGs.
///
/// The value of the match is nil.
pub fn check_action(f: impl Fn(&Values) -> bool + 'static) -> Rule {
    Rule::make(RuleNode::CheckAction(Box::new(f)))
}
