//! The rule evaluator: a recursive matcher over the rule node tree.
//!
//! Every arm observes the same contract: a non-matching rule leaves the
//! cursor where it found it, and only terminals advance it. The reference
//! arm implements packrat memoization with Warth-style seed growth for
//! direct left recursion.

use crate::grammar::Rule;
use crate::grammar::node::{RefNode, RuleNode};
use crate::value::Value;
use tracing::trace;

use super::state::State;

/// What a single rule invocation produced. A non-match never carries a
/// value.
#[derive(Debug, Clone, Default)]
pub(crate) struct MatchResult {
    pub(crate) matched: bool,
    pub(crate) value: Option<Value>,
}

impl MatchResult {
    pub(crate) fn fail() -> Self {
        Self::default()
    }

    /// A match that produced no value.
    pub(crate) fn empty() -> Self {
        Self {
            matched: true,
            value: None,
        }
    }

    pub(crate) fn with(value: Option<Value>) -> Self {
        Self {
            matched: true,
            value,
        }
    }
}

impl State<'_> {
    pub(crate) fn eval(&mut self, rule: &Rule) -> MatchResult {
        let result = self.eval_node(rule, rule.node());
        if self.debug {
            trace!(
                target: "pegmatite",
                matched = result.matched,
                pos = self.pos,
                next = self.peek_display(),
                label = ?self.labels.last(),
                rule = %rule,
            );
        }
        result
    }

    fn eval_node(&mut self, rule: &Rule, node: &RuleNode) -> MatchResult {
        match node {
            RuleNode::Any => match self.rest().chars().next() {
                Some(c) => {
                    self.advance(c.len_utf8());
                    MatchResult::empty()
                }
                None => MatchResult::fail(),
            },

            RuleNode::Eos => {
                if self.at_end() {
                    MatchResult::empty()
                } else {
                    MatchResult::fail()
                }
            }

            RuleNode::Lit(lit) => {
                if self.rest().starts_with(lit.as_ref()) {
                    self.advance(lit.len());
                    MatchResult::empty()
                } else {
                    MatchResult::fail()
                }
            }

            RuleNode::Lit1(byte) => {
                if !self.at_end() && self.byte_at(self.pos) == *byte {
                    self.advance(1);
                    MatchResult::empty()
                } else {
                    MatchResult::fail()
                }
            }

            RuleNode::Lit2([a, b]) => {
                if self.pos + 1 < self.input_size
                    && self.byte_at(self.pos) == *a
                    && self.byte_at(self.pos + 1) == *b
                {
                    self.advance(2);
                    MatchResult::empty()
                } else {
                    MatchResult::fail()
                }
            }

            RuleNode::CharRange { start, end } => match self.rest().chars().next() {
                Some(c) if *start <= c && c <= *end => {
                    self.advance(c.len_utf8());
                    MatchResult::empty()
                }
                _ => MatchResult::fail(),
            },

            RuleNode::CharSet(runes) => match self.rest().chars().next() {
                Some(c) if runes.contains(&c) => {
                    self.advance(c.len_utf8());
                    MatchResult::empty()
                }
                _ => MatchResult::fail(),
            },

            RuleNode::RunePred(pred) => match self.rest().chars().next() {
                Some(c) if pred(c) => {
                    self.advance(c.len_utf8());
                    MatchResult::empty()
                }
                _ => MatchResult::fail(),
            },

            RuleNode::Regex { re, .. } => match re.find(self.rest()) {
                Some(found) => {
                    self.advance(found.end());
                    MatchResult::empty()
                }
                None => MatchResult::fail(),
            },

            RuleNode::Scan(f) => {
                if self.at_end() {
                    return MatchResult::fail();
                }
                match f(self.rest()) {
                    Some(len) => {
                        debug_assert!(len <= self.rest().len(), "scan consumed past end of input");
                        self.advance(len);
                        MatchResult::empty()
                    }
                    None => MatchResult::fail(),
                }
            }

            RuleNode::PrefixTable(table) => {
                if self.at_end() {
                    return MatchResult::fail();
                }
                match table.get(&self.byte_at(self.pos)) {
                    Some(sub) => self.eval(sub),
                    None => MatchResult::fail(),
                }
            }

            RuleNode::NotByte(byte) => {
                if !self.at_end() && self.byte_at(self.pos) != *byte {
                    MatchResult::empty()
                } else {
                    MatchResult::fail()
                }
            }

            RuleNode::Either(a, b) => self.eval_choice([a, b]),
            RuleNode::Choice(rules) => self.eval_choice(rules.iter()),

            RuleNode::Both(a, b) => self.eval_seq([a, b]),
            RuleNode::Three(a, b, c) => self.eval_seq([a, b, c]),
            RuleNode::Seq(rules) => self.eval_seq(rules.iter()),

            RuleNode::Star(sub) => {
                let mut value = None;
                loop {
                    let mark = self.mark();
                    let result = self.eval(sub);
                    if !result.matched {
                        self.restore(mark);
                        break;
                    }
                    value = result.value;
                }
                MatchResult::with(value)
            }

            RuleNode::Plus(sub) => {
                let first = self.eval(sub);
                if !first.matched {
                    return MatchResult::fail();
                }
                let mut value = first.value;
                loop {
                    let mark = self.mark();
                    let result = self.eval(sub);
                    if !result.matched {
                        self.restore(mark);
                        break;
                    }
                    value = result.value;
                }
                MatchResult::with(value)
            }

            RuleNode::Many {
                rule: sub,
                min,
                max,
                collect,
            } => {
                let entry = self.mark();
                let mut collected = self.take_buffer();
                while max.is_none_or(|max| collected.len() < max) {
                    let mark = self.mark();
                    let result = self.eval(sub);
                    if !result.matched {
                        self.restore(mark);
                        break;
                    }
                    collected.push(result.value);
                }
                if collected.len() < *min {
                    self.put_buffer(collected);
                    self.restore(entry);
                    return MatchResult::fail();
                }
                let value = collect.as_ref().and_then(|f| f(&collected));
                self.put_buffer(collected);
                MatchResult::with(value)
            }

            RuleNode::Maybe(sub) => {
                let mark = self.mark();
                let mut result = self.eval(sub);
                if !result.matched {
                    self.restore(mark);
                }
                result.matched = true;
                result
            }

            RuleNode::Check(sub) => {
                let mark = self.mark();
                let result = self.eval(sub);
                self.restore(mark);
                result
            }

            RuleNode::Not(sub) => {
                if self.at_end() {
                    return MatchResult::fail();
                }
                let mark = self.mark();
                let result = self.eval(sub);
                self.restore(mark);
                if result.matched {
                    MatchResult::fail()
                } else {
                    MatchResult::empty()
                }
            }

            RuleNode::Ref(ref_node) => self.eval_ref(rule, ref_node),

            RuleNode::Scope(sub) => {
                let outer = std::mem::replace(&mut self.values, crate::value::Values::new());
                let result = self.eval(sub);
                self.values = outer;
                result
            }

            RuleNode::Named { name, rule: sub } => {
                let result = self.eval(sub);
                if result.matched {
                    if self.debug {
                        trace!(target: "pegmatite", name = *name, value = ?result.value, "named");
                    }
                    self.values.set(*name, result.value.clone());
                }
                result
            }

            RuleNode::Action { rule: sub, action } => {
                let start = self.mark();
                let mut result = self.eval(sub);
                if result.matched {
                    let value = action(&self.values);
                    if let Some(value) = &value {
                        value.set_position(&self.span(start));
                    }
                    result.value = value;
                }
                result
            }

            RuleNode::Transform {
                rule: sub,
                transform,
            } => {
                let start = self.mark();
                let mut result = self.eval(sub);
                if result.matched {
                    let value = transform(&self.input[start..self.pos]);
                    if let Some(value) = &value {
                        value.set_position(&self.span(start));
                    }
                    result.value = value;
                }
                result
            }

            RuleNode::Capture(sub) => {
                let start = self.mark();
                let mut result = self.eval(sub);
                if result.matched {
                    result.value = Some(Value::new(self.input[start..self.pos].to_string()));
                }
                result
            }

            RuleNode::Apply {
                rule: sub, build, ..
            } => {
                let start = self.mark();
                let mut result = self.eval(sub);
                if result.matched {
                    let value = build(&self.values);
                    value.set_position(&self.span(start));
                    result.value = Some(value);
                }
                result
            }

            RuleNode::CheckAction(pred) => {
                if pred(&self.values) {
                    MatchResult::empty()
                } else {
                    MatchResult::fail()
                }
            }

            RuleNode::Label { label, rule: sub } => {
                self.labels.push(*label);
                let result = self.eval(sub);
                self.labels.pop();
                result
            }
        }
    }

    fn eval_choice<'r>(&mut self, rules: impl IntoIterator<Item = &'r Rule>) -> MatchResult {
        let save = self.mark();
        for sub in rules {
            let result = self.eval(sub);
            if result.matched {
                return result;
            }
            self.restore(save);
        }
        MatchResult::fail()
    }

    fn eval_seq<'r>(&mut self, rules: impl IntoIterator<Item = &'r Rule>) -> MatchResult {
        let save = self.mark();
        let mut value = None;
        for sub in rules {
            let result = self.eval(sub);
            if !result.matched {
                self.restore(save);
                return MatchResult::fail();
            }
            if result.value.is_some() {
                value = result.value;
            }
        }
        MatchResult::with(value)
    }

    /// Matches a reference: replay a memo when one exists, otherwise run
    /// the body — with seed growth when the reference is left-recursive —
    /// and record the result.
    fn eval_ref(&mut self, rule: &Rule, node: &RefNode) -> MatchResult {
        let key = rule.key();
        let pos = self.mark();

        if let Some(entry) = self.memo_lookup(pos, key) {
            debug_assert!(
                entry.matched || entry.end_pos == pos,
                "memoized non-match advanced the cursor"
            );
            self.restore(entry.end_pos);
            return MatchResult {
                matched: entry.matched,
                value: entry.value,
            };
        }

        let Some(body) = node.body.get() else {
            panic!("reference {:?} matched before being bound", node.name);
        };

        let enclosing = std::mem::replace(&mut self.current_ref, Some(node.name));

        let result = if node.left_rec.get() {
            // Seed growth: start from a failing seed and re-run the body
            // until the match stops growing. Recursive uses of this
            // reference inside the body replay the current memo entry.
            self.memo_store(pos, key, false, None, pos);
            let mut last = MatchResult::fail();
            let mut last_pos = pos;
            loop {
                self.restore(pos);
                let attempt = self.eval(body);
                let end_pos = self.mark();
                if end_pos <= last_pos {
                    break;
                }
                self.memo_store(pos, key, attempt.matched, attempt.value.clone(), end_pos);
                last = attempt;
                last_pos = end_pos;
            }
            self.restore(last_pos);
            last
        } else {
            let attempt = self.eval(body);
            self.memo_store(pos, key, attempt.matched, attempt.value.clone(), self.mark());
            attempt
        };

        self.current_ref = enclosing;
        result
    }
}
